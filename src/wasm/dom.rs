//! Measurement against the live DOM
//!
//! Blocks are measured inside a scratch element that sits in the same style
//! scope as the rendered pages, so fonts and theme match what the author sees.

use crate::config::PaginationOptions;
use crate::error::{Error, Result};
use crate::layout::PageMetrics;
use crate::measure::{round_height, MeasurementOracle};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;

/// Oracle backed by a mounted scratch element
#[derive(Debug, Clone)]
pub struct DomOracle {
    scratch_id: String,
    column_gap: f32,
    row_gap: f32,
}

impl DomOracle {
    pub fn new(scratch_id: impl Into<String>) -> Self {
        let defaults = PaginationOptions::default();
        Self {
            scratch_id: scratch_id.into(),
            column_gap: defaults.column_gap,
            row_gap: defaults.row_gap,
        }
    }

    pub fn scratch_id(&self) -> &str {
        &self.scratch_id
    }

    /// The scratch element, if it is mounted
    fn scratch(&self) -> Option<HtmlElement> {
        let document = web_sys::window()?.document()?;
        let element = document.get_element_by_id(&self.scratch_id)?;
        let element = element.dyn_into::<HtmlElement>().ok()?;
        element.is_connected().then_some(element)
    }
}

impl MeasurementOracle for DomOracle {
    fn compute_metrics(&self) -> Option<PageMetrics> {
        let scratch = self.scratch()?;
        let width = scratch.client_width() as f32;
        let height = scratch.client_height() as f32;
        let column_width = ((width - self.column_gap) / 2.0).floor();
        Some(PageMetrics::new(column_width, height, self.column_gap)).filter(PageMetrics::is_usable)
    }

    fn measure_block_height(&self, markup: &str) -> Result<f32> {
        let metrics = self.compute_metrics().ok_or(Error::MeasurementUnavailable)?;
        let scratch = self.scratch().ok_or(Error::MeasurementUnavailable)?;

        let probe = ScratchProbe::attach(&scratch, metrics.column_width)?;
        probe.element.set_inner_html(markup);
        let height = probe.element.get_bounding_client_rect().height();

        Ok(round_height(height + self.row_gap as f64))
    }

    fn apply_options(&mut self, options: &PaginationOptions) {
        self.column_gap = options.column_gap;
        self.row_gap = options.row_gap.max(0.0);
    }
}

/// An invisible column-wide box, removed again on drop
struct ScratchProbe {
    element: HtmlElement,
}

impl ScratchProbe {
    fn attach(parent: &HtmlElement, width: f32) -> Result<Self> {
        let document = parent.owner_document().ok_or(Error::MeasurementUnavailable)?;
        let element = document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| Error::Measure("probe is not an HTML element".into()))?;

        let style = element.style();
        style.set_property("position", "absolute").map_err(js_error)?;
        style.set_property("visibility", "hidden").map_err(js_error)?;
        style.set_property("left", "0").map_err(js_error)?;
        style.set_property("top", "0").map_err(js_error)?;
        style
            .set_property("width", &format!("{}px", width))
            .map_err(js_error)?;

        parent.append_child(&element).map_err(js_error)?;
        Ok(Self { element })
    }
}

impl Drop for ScratchProbe {
    fn drop(&mut self) {
        self.element.remove();
    }
}

fn js_error(value: JsValue) -> Error {
    Error::Measure(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
