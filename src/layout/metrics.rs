//! Page and column dimensions

use serde::{Deserialize, Serialize};

/// Measured column geometry for the current theme and display settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub column_width: f32,
    pub column_height: f32,
    pub column_gap: f32,
}

impl PageMetrics {
    pub fn new(column_width: f32, column_height: f32, column_gap: f32) -> Self {
        Self {
            column_width,
            column_height,
            column_gap,
        }
    }

    /// Whether these metrics can drive packing at all.
    ///
    /// A scratch area that is mounted but not laid out yet reports zero
    /// sizes; packing against those would put every block on its own page.
    pub fn is_usable(&self) -> bool {
        self.column_width.is_finite()
            && self.column_height.is_finite()
            && self.column_width > 0.0
            && self.column_height > 0.0
    }
}

/// Physical page geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 816.0,   // 8.5" at 96 DPI
            page_height: 1056.0, // 11" at 96 DPI
            margin_top: 96.0,    // 1" margins
            margin_bottom: 96.0,
            margin_left: 96.0,
            margin_right: 96.0,
        }
    }
}

impl PageGeometry {
    /// Usable width between the side margins
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Usable height between top and bottom margins
    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    /// Split the content box into two columns separated by `column_gap`
    pub fn metrics(&self, column_gap: f32) -> PageMetrics {
        let gap = column_gap.max(0.0);
        PageMetrics {
            column_width: ((self.content_width() - gap) / 2.0).max(0.0),
            column_height: self.content_height().max(0.0),
            column_gap: gap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_geometry() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.content_width(), 624.0); // 816 - 96 - 96
        assert_eq!(geometry.content_height(), 864.0); // 1056 - 96 - 96

        let metrics = geometry.metrics(24.0);
        assert_eq!(metrics.column_width, 300.0);
        assert_eq!(metrics.column_height, 864.0);
        assert_eq!(metrics.column_gap, 24.0);
    }

    #[test]
    fn test_negative_gap_is_clamped() {
        let metrics = PageGeometry::default().metrics(-10.0);
        assert_eq!(metrics.column_gap, 0.0);
        assert_eq!(metrics.column_width, 312.0);
    }

    #[test]
    fn test_metrics_usable() {
        assert!(PageMetrics::new(300.0, 800.0, 24.0).is_usable());
        assert!(!PageMetrics::new(0.0, 800.0, 24.0).is_usable());
        assert!(!PageMetrics::new(300.0, 0.0, 24.0).is_usable());
        assert!(!PageMetrics::new(300.0, f32::NAN, 24.0).is_usable());
    }

    #[test]
    fn test_metrics_json_is_camel_case() {
        let json = serde_json::to_value(PageMetrics::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json["columnWidth"], 1.0);
        assert_eq!(json["columnHeight"], 2.0);
        assert_eq!(json["columnGap"], 3.0);
    }
}
