//! WASM bindings for the paginator

pub mod console;
pub mod dom;

pub use console::init_logging;
pub use dom::DomOracle;

use crate::config::PaginationOptions;
use crate::controller::PaginationController;
use crate::document::{Block, Document};
use crate::error::{Error, Result};
use crate::measure::{BlockRenderer, MarkupRenderer};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    init_logging(log::LevelFilter::Info);
}

/// Slot for the host's block-to-markup function
type RenderSlot = Rc<RefCell<Option<js_sys::Function>>>;

/// Calls the host's `(blockJson) => markup` function, or renders plain
/// markup until one is set.
struct JsBlockRenderer {
    render: RenderSlot,
}

impl BlockRenderer for JsBlockRenderer {
    fn render_block(&self, block: &Block) -> Result<String> {
        let slot = self.render.borrow();
        let Some(render) = slot.as_ref() else {
            return MarkupRenderer.render_block(block);
        };

        let json = serde_json::to_string(block)?;
        let markup = render
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map_err(|e| Error::Render(describe(&e)))?;
        markup
            .as_string()
            .ok_or_else(|| Error::Render(format!("renderer returned no markup for `{}`", block.kind)))
    }
}

/// WASM-exposed paginator wrapper
#[wasm_bindgen]
pub struct WasmPaginator {
    controller: PaginationController,
    render: RenderSlot,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator measuring inside the element with this id
    #[wasm_bindgen(constructor)]
    pub fn new(scratch_element_id: &str) -> Self {
        let render = RenderSlot::default();
        let controller = PaginationController::new(
            Box::new(DomOracle::new(scratch_element_id)),
            Box::new(JsBlockRenderer {
                render: render.clone(),
            }),
        );
        Self { controller, render }
    }

    /// Inject the block-to-markup function and repaginate
    #[wasm_bindgen(js_name = setRenderer)]
    pub fn set_renderer(&mut self, render: js_sys::Function) {
        *self.render.borrow_mut() = Some(render);
        self.controller.refresh();
    }

    /// Replace the document (JSON). Malformed documents are paginated as a
    /// single opaque block; only unparseable JSON is an error.
    #[wasm_bindgen(js_name = setDocument)]
    pub fn set_document(&mut self, json: &str) -> std::result::Result<bool, JsValue> {
        let value: Value = serde_json::from_str(json).map_err(to_js)?;
        let document = Document::from_value_lenient(value);
        Ok(self.controller.set_document(Rc::new(document)))
    }

    /// Replace display options (JSON); returns whether pages were recomputed
    #[wasm_bindgen(js_name = setOptions)]
    pub fn set_options(&mut self, json: &str) -> std::result::Result<bool, JsValue> {
        let options = PaginationOptions::from_json(json).map_err(to_js)?;
        Ok(self.controller.set_options(options))
    }

    #[wasm_bindgen(js_name = setAutoPaginate)]
    pub fn set_auto_paginate(&mut self, enabled: bool) -> bool {
        self.controller.set_auto_paginate(enabled)
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f32) {
        self.controller.set_zoom(zoom);
    }

    /// Repaginate after a theme change or once the scratch element mounts
    pub fn refresh(&mut self) {
        self.controller.refresh();
    }

    /// Advance deferred state transitions; call once per frame or effect
    pub fn tick(&mut self) {
        self.controller.tick();
    }

    /// The published pages as JSON
    #[wasm_bindgen(js_name = pagesJson)]
    pub fn pages_json(&self) -> std::result::Result<String, JsValue> {
        let list = self.controller.pages();
        let payload = PagesPayload {
            version: list.version,
            state: self.controller.state().as_str(),
            zoom: self.controller.options().zoom,
            pages: &list.pages,
        };
        serde_json::to_string(&payload).map_err(to_js)
    }

    /// Version of the published page list
    pub fn version(&self) -> f64 {
        self.controller.version() as f64
    }

    pub fn state(&self) -> String {
        self.controller.state().to_string()
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.controller.pages().len()
    }
}

/// Serializable page list for JS
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PagesPayload<'a> {
    version: u64,
    state: &'static str,
    zoom: f32,
    pages: &'a [crate::layout::Page],
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}
