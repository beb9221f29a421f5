//! Block-level content units

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Type tag of the reserved manual page break block
pub const PAGE_BREAK: &str = "pageBreak";

/// Type tag used when a raw value carries no usable `type`
pub const UNKNOWN_BLOCK: &str = "unknown";

/// Page-level styling carried by a manual page break
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreakAttrs {
    /// Space-separated CSS classes for the page container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    /// Inline style declarations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<BTreeMap<String, String>>,
    /// Extra HTML attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    /// Element id of the page container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl PageBreakAttrs {
    /// Check if no attribute is set
    pub fn is_empty(&self) -> bool {
        self.classes.is_none()
            && self.styles.is_none()
            && self.attributes.is_none()
            && self.id.is_none()
    }
}

/// The kind of a block, as far as layout cares
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BlockKind {
    /// Regular paragraph
    #[default]
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    /// Manual page break marker
    PageBreak,
    /// Anything else (tables, embeds, lists...), opaque to the core
    Other(String),
}

impl BlockKind {
    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    /// Line height multiplier used when estimating heights
    pub fn line_height_multiplier(&self) -> f32 {
        match self {
            BlockKind::Heading { level } => match level {
                1 => 1.5,
                2 => 1.4,
                3 => 1.3,
                _ => 1.2,
            },
            _ => 1.0,
        }
    }
}

/// A single content block: `{ "type": ..., ...payload }`
///
/// Everything besides the type tag is kept verbatim in `payload` so that
/// pages hand the renderer exactly what the author wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Block {
    /// Create a block with an empty payload
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Create a paragraph holding a single text node
    pub fn paragraph(text: &str) -> Self {
        Self::new("paragraph").with(
            "content",
            serde_json::json!([{ "type": "text", "text": text }]),
        )
    }

    /// Create a manual page break, optionally carrying page attributes
    pub fn page_break(attrs: Option<PageBreakAttrs>) -> Self {
        let block = Self::new(PAGE_BREAK);
        match attrs.and_then(|a| serde_json::to_value(a).ok()) {
            Some(value) => block.with("attrs", value),
            None => block,
        }
    }

    /// Builder-style payload setter
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Build a block from an arbitrary JSON value without failing.
    ///
    /// Objects keep their `type` (or get [`UNKNOWN_BLOCK`], with a non-string
    /// tag moved to `rawType`); any other value is wrapped under `value`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let kind = match map.remove("type") {
                    Some(Value::String(kind)) => kind,
                    Some(other) => {
                        map.insert("rawType".to_string(), other);
                        UNKNOWN_BLOCK.to_string()
                    }
                    None => UNKNOWN_BLOCK.to_string(),
                };
                Self { kind, payload: map }
            }
            other => Self::new(UNKNOWN_BLOCK).with("value", other),
        }
    }

    /// Check if this block is a manual page break
    pub fn is_page_break(&self) -> bool {
        self.kind == PAGE_BREAK
    }

    /// Attributes of a page break block.
    ///
    /// Returns `None` for other blocks, for breaks without attributes, and
    /// for attributes that do not have the expected shape.
    pub fn page_break_attrs(&self) -> Option<PageBreakAttrs> {
        if !self.is_page_break() {
            return None;
        }
        let raw = self.payload.get("attrs")?;
        if raw.is_null() {
            return None;
        }
        match PageBreakAttrs::deserialize(raw) {
            Ok(attrs) => Some(attrs),
            Err(err) => {
                log::warn!("Ignoring malformed page break attrs: {}", err);
                None
            }
        }
    }

    /// Classify the block for layout purposes
    pub fn block_kind(&self) -> BlockKind {
        match self.kind.as_str() {
            "paragraph" => BlockKind::Paragraph,
            PAGE_BREAK => BlockKind::PageBreak,
            "heading" => {
                let level = self
                    .payload
                    .get("attrs")
                    .and_then(|a| a.get("level"))
                    .and_then(Value::as_u64)
                    .unwrap_or(1);
                BlockKind::Heading {
                    level: level.clamp(1, 6) as u8,
                }
            }
            other => BlockKind::Other(other.to_string()),
        }
    }

    /// Plain text gathered from every nested `text` field, in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        for value in self.payload.values() {
            collect_text(value, &mut out);
        }
        out
    }
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(content) = map.get("content") {
                collect_text(content, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}
