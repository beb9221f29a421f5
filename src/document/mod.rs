//! Document model: an ordered list of opaque blocks plus manual page breaks

mod block;

pub use block::{Block, BlockKind, PageBreakAttrs, PAGE_BREAK, UNKNOWN_BLOCK};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type tag of a document node
pub const DOC_TYPE: &str = "doc";

fn doc_type() -> String {
    DOC_TYPE.to_string()
}

/// The document tree: `{ "type": "doc", "content": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type", default = "doc_type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    /// Create a document from top-level blocks
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            kind: doc_type(),
            content,
        }
    }

    /// Parse a document from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a document from a JSON value.
    ///
    /// Fails with [`Error::MalformedDocument`] when `content` is missing or
    /// not an array. Entries inside `content` never fail: odd ones become
    /// opaque blocks.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::MalformedDocument("document is not an object".into()));
        };
        let kind = match map.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => doc_type(),
        };
        match map.remove("content") {
            Some(Value::Array(items)) => Ok(Self {
                kind,
                content: items.into_iter().map(Block::from_value).collect(),
            }),
            Some(_) => Err(Error::MalformedDocument("`content` is not an array".into())),
            None => Err(Error::MalformedDocument("missing `content`".into())),
        }
    }

    /// Build a document from any JSON value, degrading instead of failing.
    ///
    /// `null` is an empty document. Anything [`Document::from_value`]
    /// rejects becomes a document holding the raw value as one opaque
    /// block, never as a page break.
    pub fn from_value_lenient(value: Value) -> Self {
        if value.is_null() {
            log::warn!("No document given; using an empty one");
            return Self::default();
        }
        match Self::from_value(value.clone()) {
            Ok(document) => document,
            Err(err) => {
                log::warn!("{}; passing input through as one block", err);
                let block = Block::from_value(value.clone());
                // A bare break object would be consumed by the splitter
                let block = if block.is_page_break() {
                    Block::new(UNKNOWN_BLOCK).with("value", value)
                } else {
                    block
                };
                Self::new(vec![block])
            }
        }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number of top-level blocks, page breaks excluded
    pub fn block_count(&self) -> usize {
        self.content.iter().filter(|b| !b.is_page_break()).count()
    }

    /// Number of manual page breaks
    pub fn page_break_count(&self) -> usize {
        self.content.iter().filter(|b| b.is_page_break()).count()
    }

    /// Check if document has no blocks at all
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_document() {
        let doc = Document::default();
        assert_eq!(doc.kind, DOC_TYPE);
        assert!(doc.is_empty());
        assert_eq!(doc.block_count(), 0);
    }

    #[test]
    fn test_from_json() {
        let doc = Document::from_json(
            r#"{"type":"doc","content":[
                {"type":"paragraph"},
                {"type":"pageBreak","attrs":{"classes":"art"}},
                {"type":"table"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(doc.content.len(), 3);
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.page_break_count(), 1);
    }

    #[test]
    fn test_from_value_rejects_malformed() {
        assert!(matches!(
            Document::from_value(json!({ "type": "doc" })),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            Document::from_value(json!({ "type": "doc", "content": "oops" })),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            Document::from_value(json!([1, 2])),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_from_value_keeps_odd_entries() {
        let doc = Document::from_value(json!({
            "type": "doc",
            "content": [{ "type": "paragraph" }, "stray", { "noType": true }]
        }))
        .unwrap();
        assert_eq!(doc.content.len(), 3);
        assert_eq!(doc.content[1].kind, UNKNOWN_BLOCK);
        assert_eq!(doc.content[2].kind, UNKNOWN_BLOCK);
    }

    #[test]
    fn test_from_value_lenient() {
        assert!(Document::from_value_lenient(Value::Null).is_empty());

        let doc = Document::from_value_lenient(json!([1, 2]));
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].kind, UNKNOWN_BLOCK);
        assert_eq!(doc.content[0].payload["value"], json!([1, 2]));

        let raw = json!({ "type": "pageBreak", "attrs": { "id": "x" } });
        let doc = Document::from_value_lenient(raw.clone());
        assert_eq!(doc.page_break_count(), 0);
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.content[0].payload["value"], raw);

        let doc = Document::from_value_lenient(json!({ "type": "doc", "content": [{ "type": "table" }] }));
        assert_eq!(doc.content[0].kind, "table");
    }

    #[test]
    fn test_json_roundtrip() {
        let doc = Document::new(vec![Block::paragraph("Hello"), Block::page_break(None)]);
        let parsed = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }
}
