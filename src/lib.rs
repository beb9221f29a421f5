//! Folio: two-column pagination for block documents
//!
//! This crate turns an ordered list of blocks into pages:
//! - Manual `pageBreak` blocks split the document into segments
//! - Each segment is packed first-fit into two fixed-height columns
//! - Block heights come from real rendering through an injected oracle
//! - Any failure degrades to one page per manual segment

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod layout;
pub mod measure;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use config::PaginationOptions;
pub use controller::{ErrorReporter, LogReporter, PageList, PaginationController, PaginationState};
pub use document::{Block, BlockKind, Document, PageBreakAttrs};
pub use error::{Error, Result};
pub use layout::{
    manual_pages, pack_segment, pack_segments, split_segments, split_value, ColumnLayout, Page,
    PageGeometry, PageMetrics, Segment,
};
pub use measure::{BlockRenderer, HeadlessOracle, MarkupRenderer, MeasurementOracle};

use std::rc::Rc;

/// Paginate a document once with the headless oracle.
///
/// Returns manual-break pages when `options.auto_paginate` is off or the
/// pass fails, exactly like a controller would publish them.
pub fn paginate_headless(
    document: Document,
    geometry: PageGeometry,
    options: PaginationOptions,
) -> (PaginationState, Vec<Page>) {
    let oracle = HeadlessOracle::new(geometry, measure::FontMetrics::default());
    let mut controller =
        PaginationController::new(Box::new(oracle), Box::new(MarkupRenderer)).with_options(options);
    controller.set_document(Rc::new(document));
    (controller.state(), controller.pages().pages.to_vec())
}
