//! Line counting for estimated block heights

use crate::measure::font::FontMetrics;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Greedy line breaker over Unicode break opportunities
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Number of lines `text` wraps to at `max_width`.
    ///
    /// Empty text still occupies one line.
    pub fn line_count(&self, text: &str, max_width: f32, font: &FontMetrics) -> usize {
        if !(max_width > 0.0) {
            return text.split('\n').count();
        }

        let mut lines = 1;
        let mut x: f32 = 0.0;
        let mut start = 0;

        for (end, opportunity) in linebreaks(text) {
            let word = &text[start..end];
            start = end;

            let advance = font.text_width(word);
            // Trailing spaces may hang past the edge
            let visible = font.text_width(word.trim_end());

            if x + visible <= max_width {
                x += advance;
            } else if visible <= max_width {
                lines += 1;
                x = advance;
            } else {
                // Word wider than a line: emergency breaks between graphemes
                if x > 0.0 {
                    lines += 1;
                    x = 0.0;
                }
                for grapheme in word.graphemes(true) {
                    let width = font.grapheme_width(grapheme);
                    if x + width > max_width && x > 0.0 {
                        lines += 1;
                        x = 0.0;
                    }
                    x += width;
                }
            }

            if opportunity == BreakOpportunity::Mandatory && end < text.len() {
                lines += 1;
                x = 0.0;
            }
        }

        lines
    }
}
