//! Measurement boundary between the pure layout code and real rendering
//!
//! The packer only ever sees [`BlockHeights`]. In the browser the heights
//! come from rendering a block to markup ([`BlockRenderer`]) and measuring
//! that markup inside the page's style scope ([`MeasurementOracle`]).

mod font;
pub mod headless;
mod line_break;

pub use font::FontMetrics;
pub use headless::{HeadlessOracle, MarkupRenderer};
pub use line_break::LineBreaker;

use crate::config::PaginationOptions;
use crate::document::Block;
use crate::error::Result;
use crate::layout::PageMetrics;

/// Reports real rendered dimensions under the current theme
pub trait MeasurementOracle {
    /// Column geometry, or `None` while the measurement context is not
    /// mounted. Auto-pagination only runs when this returns `Some`.
    fn compute_metrics(&self) -> Option<PageMetrics>;

    /// Rendered height in pixels of one block's markup at the current
    /// column width, rounded up and at least 1.
    fn measure_block_height(&self, markup: &str) -> Result<f32>;

    /// Called when layout-affecting display options change
    fn apply_options(&mut self, _options: &PaginationOptions) {}
}

/// Converts a block into the markup real pages render it with
pub trait BlockRenderer {
    fn render_block(&self, block: &Block) -> Result<String>;
}

/// Height source consumed by the packer
pub trait BlockHeights {
    fn block_height(&mut self, block: &Block) -> Result<f32>;
}

impl<F> BlockHeights for F
where
    F: FnMut(&Block) -> Result<f32>,
{
    fn block_height(&mut self, block: &Block) -> Result<f32> {
        self(block)
    }
}

/// Render-then-measure heights
pub struct RenderedHeights<'a> {
    renderer: &'a dyn BlockRenderer,
    oracle: &'a dyn MeasurementOracle,
    measured: usize,
}

impl<'a> RenderedHeights<'a> {
    pub fn new(renderer: &'a dyn BlockRenderer, oracle: &'a dyn MeasurementOracle) -> Self {
        Self {
            renderer,
            oracle,
            measured: 0,
        }
    }

    /// Number of blocks measured so far
    pub fn measured(&self) -> usize {
        self.measured
    }
}

impl BlockHeights for RenderedHeights<'_> {
    fn block_height(&mut self, block: &Block) -> Result<f32> {
        let markup = self.renderer.render_block(block)?;
        let height = self.oracle.measure_block_height(&markup)?;
        self.measured += 1;
        Ok(height)
    }
}

/// Round a raw pixel height the way measurements are reported
pub fn round_height(raw: f64) -> f32 {
    if raw.is_finite() {
        (raw.ceil() as f32).max(1.0)
    } else {
        1.0
    }
}
