//! Display options that drive pagination

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Options set by the host UI.
///
/// `column_gap` and `row_gap` change measured layout and trigger a
/// recompute; `zoom` is a post-layout scale and never does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationOptions {
    /// Pack blocks into columns; when off, pages follow manual breaks only
    pub auto_paginate: bool,
    /// Gap between the two columns, in CSS pixels
    pub column_gap: f32,
    /// Vertical gap between consecutive blocks, in CSS pixels
    pub row_gap: f32,
    /// Visual zoom of the page view
    pub zoom: f32,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            auto_paginate: false,
            column_gap: 24.0,
            row_gap: 0.0,
            zoom: 1.0,
        }
    }
}

/// The subset of options that affects measured layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutKey {
    pub column_gap: f32,
    pub row_gap: f32,
}

impl PaginationOptions {
    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn layout_key(&self) -> LayoutKey {
        LayoutKey {
            column_gap: self.column_gap,
            row_gap: self.row_gap,
        }
    }

    /// Whether switching from `self` to `next` requires a new pagination pass
    pub fn needs_recompute(&self, next: &PaginationOptions) -> bool {
        self.auto_paginate != next.auto_paginate || self.layout_key() != next.layout_key()
    }
}
