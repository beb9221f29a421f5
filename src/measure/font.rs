//! Font metrics for height estimation

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Approximate metrics of the body font
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontMetrics {
    /// Line height in CSS pixels
    pub line_height: f32,
    /// Advance widths of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Width used for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        // 14px body text at 1.2 line height
        Self::uniform(16.8, 8.41)
    }
}

impl FontMetrics {
    /// Metrics where every character has the same advance
    pub fn uniform(line_height: f32, width: f32) -> Self {
        Self {
            line_height,
            char_widths: vec![width; 128],
            default_width: width,
        }
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c.is_control() {
            return 0.0;
        }
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }

    /// Width of a grapheme cluster; combining marks add nothing
    pub fn grapheme_width(&self, grapheme: &str) -> f32 {
        match grapheme {
            "\t" => self.default_width * 4.0,
            _ => grapheme.chars().next().map(|c| self.width(c)).unwrap_or(0.0),
        }
    }

    /// Width of a run of text
    pub fn text_width(&self, text: &str) -> f32 {
        text.graphemes(true).map(|g| self.grapheme_width(g)).sum()
    }
}
