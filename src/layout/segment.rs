//! Splitting a document into segments at manual page breaks

use crate::document::{Block, Document, PageBreakAttrs};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// Blocks between two manual breaks, plus the attrs of the opening break
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub blocks: Vec<Block>,
    pub attrs: Option<PageBreakAttrs>,
}

impl Segment {
    pub fn new(attrs: Option<PageBreakAttrs>) -> Self {
        Self {
            blocks: Vec::new(),
            attrs,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Hash of blocks and attrs, used to key packed pages across passes
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.attrs.hash(&mut hasher);
        self.blocks.len().hash(&mut hasher);
        for block in &self.blocks {
            block.kind.hash(&mut hasher);
            hash_map(&block.payload, &mut hasher);
        }
        hasher.finish()
    }
}

fn hash_map<H: Hasher>(map: &serde_json::Map<String, Value>, hasher: &mut H) {
    map.len().hash(hasher);
    for (key, value) in map {
        key.hash(hasher);
        hash_value(value, hasher);
    }
}

fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    std::mem::discriminant(value).hash(hasher);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(hasher),
        Value::Number(n) => n.to_string().hash(hasher),
        Value::String(s) => s.hash(hasher),
        Value::Array(items) => {
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(map) => hash_map(map, hasher),
    }
}

/// Split a document at its top-level `pageBreak` blocks.
///
/// Always returns at least one segment. Every break closes the current
/// segment, even an empty one, so `n` breaks yield `n + 1` segments.
pub fn split_segments(document: &Document) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(document.page_break_count() + 1);
    let mut current = Segment::new(None);

    for block in &document.content {
        if block.is_page_break() {
            let next = Segment::new(block.page_break_attrs());
            segments.push(std::mem::replace(&mut current, next));
        } else {
            current.blocks.push(block.clone());
        }
    }

    segments.push(current);
    segments
}

/// Split untyped input, degrading instead of failing.
///
/// Missing or null input gives one empty segment. Input whose `content` is
/// not an array gives one segment holding the raw value as a single block.
pub fn split_value(input: Option<&Value>) -> Vec<Segment> {
    let raw = match input {
        None | Some(Value::Null) => {
            log::warn!("No document to split; emitting a single empty segment");
            return vec![Segment::new(None)];
        }
        Some(raw) => raw,
    };

    match Document::from_value(raw.clone()) {
        Ok(document) => split_segments(&document),
        Err(err) => {
            log::warn!("{}; passing input through as one segment", err);
            vec![Segment {
                blocks: vec![Block::from_value(raw.clone())],
                attrs: None,
            }]
        }
    }
}
