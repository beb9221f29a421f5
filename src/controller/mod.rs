//! Pagination lifecycle: when to repaginate and what to publish
//!
//! The controller is the only error boundary around splitting and packing.
//! Whatever goes wrong in a pass (missing measurements, a failing renderer)
//! ends in a published list of manual-break pages, never in an error
//! reaching the host. On native targets a panic in an injected collaborator
//! is contained the same way. `wasm32-unknown-unknown` aborts on panic, so
//! there only errors are contained; JS exceptions arrive as `Err` values.

mod cache;
mod report;

pub use cache::{SegmentCache, SegmentKey};
pub use report::{ErrorReporter, LogReporter};

use crate::config::PaginationOptions;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::layout::{manual_pages, pack_segment, split_segments, Page, PageMetrics};
use crate::measure::{BlockHeights, BlockRenderer, MeasurementOracle, RenderedHeights};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Lifecycle state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationState {
    /// No pass has run yet
    #[default]
    Idle,
    /// A packing pass is in progress
    Computing,
    /// The published pages were packed into columns
    Ready,
    /// The published pages follow manual breaks only
    Fallback,
    /// The last pass failed; becomes `Fallback` on the next tick
    Failed,
}

impl PaginationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaginationState::Idle => "idle",
            PaginationState::Computing => "computing",
            PaginationState::Ready => "ready",
            PaginationState::Fallback => "fallback",
            PaginationState::Failed => "failed",
        }
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, complete page list
#[derive(Debug, Clone)]
pub struct PageList {
    /// Increments once per published list
    pub version: u64,
    pub pages: Rc<[Page]>,
}

impl Default for PageList {
    fn default() -> Self {
        Self {
            version: 0,
            pages: Rc::from(Vec::new()),
        }
    }
}

impl PageList {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Owns the recompute lifecycle and the published pages
pub struct PaginationController {
    oracle: Box<dyn MeasurementOracle>,
    renderer: Box<dyn BlockRenderer>,
    reporter: Box<dyn ErrorReporter>,
    options: PaginationOptions,
    document: Option<Rc<Document>>,
    state: PaginationState,
    published: PageList,
    cache: SegmentCache,
}

impl PaginationController {
    pub fn new(oracle: Box<dyn MeasurementOracle>, renderer: Box<dyn BlockRenderer>) -> Self {
        let mut controller = Self {
            oracle,
            renderer,
            reporter: Box::new(LogReporter),
            options: PaginationOptions::default(),
            document: None,
            state: PaginationState::Idle,
            published: PageList::default(),
            cache: SegmentCache::new(),
        };
        controller.oracle.apply_options(&controller.options);
        controller
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_options(mut self, options: PaginationOptions) -> Self {
        self.oracle.apply_options(&options);
        self.options = options;
        self
    }

    /// Replace the document. Passing the same `Rc` again is a no-op.
    ///
    /// Returns whether a pass ran.
    pub fn set_document(&mut self, document: Rc<Document>) -> bool {
        if let Some(current) = &self.document {
            if Rc::ptr_eq(current, &document) {
                return false;
            }
        }
        self.document = Some(document);
        self.recompute();
        true
    }

    /// Update display options; only layout-affecting changes repaginate.
    ///
    /// Returns whether a pass ran.
    pub fn set_options(&mut self, options: PaginationOptions) -> bool {
        let recompute = self.options.needs_recompute(&options);
        if self.options.layout_key() != options.layout_key() {
            self.oracle.apply_options(&options);
            self.cache.clear();
        }
        self.options = options;
        if recompute {
            self.recompute();
        }
        recompute
    }

    /// Toggle the auto-pagination feature flag
    pub fn set_auto_paginate(&mut self, enabled: bool) -> bool {
        self.set_options(PaginationOptions {
            auto_paginate: enabled,
            ..self.options
        })
    }

    /// Zoom is applied after layout and never repaginates
    pub fn set_zoom(&mut self, zoom: f32) {
        self.options.zoom = zoom;
    }

    /// Run a fresh pass after something the controller does not watch
    /// changed (theme, scratch area mounted or unmounted).
    pub fn refresh(&mut self) {
        self.cache.clear();
        self.recompute();
    }

    /// Advance deferred transitions
    pub fn tick(&mut self) {
        if self.state == PaginationState::Failed {
            self.state = PaginationState::Fallback;
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// The last published page list
    pub fn pages(&self) -> &PageList {
        &self.published
    }

    pub fn version(&self) -> u64 {
        self.published.version
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    pub fn document(&self) -> Option<&Rc<Document>> {
        self.document.as_ref()
    }

    fn recompute(&mut self) {
        let Some(document) = self.document.clone() else {
            return;
        };

        if !self.options.auto_paginate {
            self.fall_back(&document);
            return;
        }

        let Some(metrics) = self.oracle.compute_metrics().filter(PageMetrics::is_usable) else {
            log::warn!("{}; using manual page breaks", Error::MeasurementUnavailable);
            self.fall_back(&document);
            return;
        };

        self.state = PaginationState::Computing;
        match self.guarded_pass(&document, metrics) {
            Ok(pages) => {
                log::debug!(
                    "Paginated {} blocks into {} pages",
                    document.block_count(),
                    pages.len()
                );
                self.publish(pages);
                self.state = PaginationState::Ready;
            }
            Err(err) if err.is_transient() => {
                log::warn!("{}; using manual page breaks", err);
                self.cache.clear();
                self.fall_back(&document);
            }
            Err(err) => {
                self.reporter.report(&err);
                let pages = manual_split(&document);
                self.publish(pages);
                self.state = PaginationState::Failed;
            }
        }
    }

    fn guarded_pass(&mut self, document: &Document, metrics: PageMetrics) -> Result<Vec<Page>> {
        let Self {
            oracle,
            renderer,
            cache,
            ..
        } = self;
        let mut heights = RenderedHeights::new(&**renderer, &**oracle);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            paginate(document, metrics, &mut heights, cache)
        }))
        .unwrap_or_else(|payload| Err(Error::Packing(panic_message(payload.as_ref()))));
        log::debug!("Measured {} blocks", heights.measured());
        outcome
    }

    fn fall_back(&mut self, document: &Document) {
        let pages = manual_split(document);
        self.publish(pages);
        self.state = PaginationState::Fallback;
    }

    fn publish(&mut self, pages: Vec<Page>) {
        self.published = PageList {
            version: self.published.version + 1,
            pages: Rc::from(pages),
        };
    }
}

/// Split and pack a whole document, reusing cached segments
pub fn paginate<H>(
    document: &Document,
    metrics: PageMetrics,
    heights: &mut H,
    cache: &mut SegmentCache,
) -> Result<Vec<Page>>
where
    H: BlockHeights + ?Sized,
{
    cache.begin_pass(metrics);
    let segments = split_segments(document);
    let mut pages = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        let key = (index, segment.content_hash());
        if let Some(cached) = cache.get(key, segment) {
            pages.extend_from_slice(cached);
            continue;
        }
        let packed = pack_segment(segment, &metrics, heights)?;
        pages.extend_from_slice(&packed);
        cache.insert(key, segment.clone(), packed);
    }

    cache.end_pass();
    let (hits, misses) = cache.stats();
    log::debug!(
        "Segment cache: {} hits, {} misses, {} entries",
        hits,
        misses,
        cache.len()
    );
    Ok(pages)
}

/// Manual-break pages, guarded like a packing pass
fn manual_split(document: &Document) -> Vec<Page> {
    let split = AssertUnwindSafe(|| manual_pages(&split_segments(document)));
    panic::catch_unwind(split).unwrap_or_else(|payload| {
        log::error!("Manual split failed: {}", panic_message(payload.as_ref()));
        vec![Page {
            doc: Document::new(
                document
                    .content
                    .iter()
                    .filter(|b| !b.is_page_break())
                    .cloned()
                    .collect(),
            ),
            attrs: None,
            layout: None,
        }]
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic with unknown payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, PageBreakAttrs};
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};

    /// Handles into the fake oracle, kept by the test
    #[derive(Clone, Default)]
    struct Probe {
        metrics: Rc<Cell<Option<PageMetrics>>>,
        measured: Rc<Cell<usize>>,
    }

    impl Probe {
        fn with_metrics(column_height: f32) -> Self {
            let probe = Probe::default();
            probe.metrics.set(Some(PageMetrics::new(300.0, column_height, 24.0)));
            probe
        }
    }

    /// Measures markup produced by `HeightRenderer`: the markup is the height
    struct FakeOracle(Probe);

    impl MeasurementOracle for FakeOracle {
        fn compute_metrics(&self) -> Option<PageMetrics> {
            self.0.metrics.get()
        }

        fn measure_block_height(&self, markup: &str) -> Result<f32> {
            self.0.measured.set(self.0.measured.get() + 1);
            markup
                .parse::<f32>()
                .map_err(|e| Error::Measure(e.to_string()))
        }

        fn apply_options(&mut self, options: &PaginationOptions) {
            if let Some(metrics) = self.0.metrics.get() {
                self.0.metrics.set(Some(PageMetrics {
                    column_gap: options.column_gap,
                    ..metrics
                }));
            }
        }
    }

    struct HeightRenderer;

    impl BlockRenderer for HeightRenderer {
        fn render_block(&self, block: &Block) -> Result<String> {
            match block.kind.as_str() {
                "broken" => Err(Error::Render("no markup for broken".into())),
                "explode" => panic!("renderer exploded"),
                "unmounted" => Err(Error::MeasurementUnavailable),
                _ => Ok(block
                    .payload
                    .get("height")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0)
                    .to_string()),
            }
        }
    }

    fn sized(height: f32) -> Block {
        Block::new("paragraph").with("height", json!(height))
    }

    fn auto() -> PaginationOptions {
        PaginationOptions {
            auto_paginate: true,
            ..Default::default()
        }
    }

    fn controller(probe: &Probe) -> PaginationController {
        PaginationController::new(Box::new(FakeOracle(probe.clone())), Box::new(HeightRenderer))
    }

    fn chapter() -> PageBreakAttrs {
        PageBreakAttrs {
            id: Some("chapter-2".to_string()),
            ..Default::default()
        }
    }

    /// Two 200px blocks, a break, then three 200px blocks
    fn two_segment_doc() -> Rc<Document> {
        Rc::new(Document::new(vec![
            sized(200.0),
            sized(200.0),
            Block::page_break(Some(chapter())),
            sized(200.0),
            sized(200.0),
            sized(200.0),
        ]))
    }

    #[test]
    fn test_no_document_publishes_nothing() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.refresh();
        assert_eq!(controller.state(), PaginationState::Idle);
        assert_eq!(controller.version(), 0);
        assert!(controller.pages().is_empty());
    }

    #[test]
    fn test_flag_off_by_default_uses_manual_breaks() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe);
        assert!(controller.set_document(two_segment_doc()));

        assert_eq!(controller.state(), PaginationState::Fallback);
        assert_eq!(controller.version(), 1);
        let pages = &controller.pages().pages;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks().len(), 2);
        assert_eq!(pages[1].blocks().len(), 3);
        assert_eq!(pages[1].attrs, Some(chapter()));
        assert_eq!(probe.measured.get(), 0);
    }

    #[test]
    fn test_missing_metrics_never_packs() {
        let probe = Probe::default();
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());

        assert_eq!(controller.state(), PaginationState::Fallback);
        assert_eq!(controller.pages().len(), 2);
        assert!(controller.pages().pages.iter().all(|p| p.layout.is_none()));
        assert_eq!(probe.measured.get(), 0);
    }

    #[test]
    fn test_auto_pagination_packs_columns() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());

        assert_eq!(controller.state(), PaginationState::Ready);
        let pages = &controller.pages().pages;
        // segment 1: one page, one block per column
        // segment 2: one full page plus one block
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages[0].layout.as_ref().unwrap().columns.as_slice(),
            &[0, 1]
        );
        assert_eq!(pages[1].attrs, Some(chapter()));
        assert_eq!(pages[1].blocks().len(), 2);
        assert!(pages[2].attrs.is_none());
        assert_eq!(pages[2].blocks().len(), 1);
        assert_eq!(probe.measured.get(), 5);
    }

    #[test]
    fn test_blank_pages_from_consecutive_breaks() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(Rc::new(Document::new(vec![
            Block::page_break(None),
            Block::page_break(None),
        ])));

        assert_eq!(controller.state(), PaginationState::Ready);
        assert_eq!(controller.pages().len(), 3);
        assert!(controller.pages().pages.iter().all(Page::is_blank));
    }

    #[test]
    fn test_same_document_reference_is_ignored() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        let doc = two_segment_doc();

        assert!(controller.set_document(doc.clone()));
        assert!(!controller.set_document(doc));
        assert_eq!(controller.version(), 1);
    }

    #[test]
    fn test_new_reference_reuses_cached_segments() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());
        let first = controller.pages().clone();
        assert_eq!(probe.measured.get(), 5);

        // equal content behind a new reference: recomputed, but nothing is remeasured
        assert!(controller.set_document(two_segment_doc()));
        assert_eq!(probe.measured.get(), 5);
        assert_eq!(controller.version(), 2);
        assert_eq!(&*controller.pages().pages, &*first.pages);
    }

    #[test]
    fn test_edit_only_remeasures_changed_segment() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());

        let mut edited = (*two_segment_doc()).clone();
        edited.content[4] = sized(100.0);
        controller.set_document(Rc::new(edited));

        // only the three blocks of the second segment are measured again
        assert_eq!(probe.measured.get(), 8);
    }

    #[test]
    fn test_zoom_does_not_repaginate() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());

        controller.set_zoom(1.75);
        assert!(!controller.set_options(PaginationOptions {
            zoom: 0.5,
            ..*controller.options()
        }));
        assert_eq!(controller.version(), 1);
        assert_eq!(controller.options().zoom, 0.5);
    }

    #[test]
    fn test_gap_change_repaginates_from_scratch() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());

        assert!(controller.set_options(PaginationOptions {
            column_gap: 40.0,
            ..*controller.options()
        }));
        assert_eq!(controller.version(), 2);
        assert_eq!(probe.metrics.get().unwrap().column_gap, 40.0);
        assert_eq!(probe.measured.get(), 10);

        assert!(controller.set_options(PaginationOptions {
            row_gap: 6.0,
            ..*controller.options()
        }));
        assert_eq!(controller.version(), 3);
    }

    #[test]
    fn test_toggling_flag_switches_modes() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe);
        controller.set_document(two_segment_doc());
        assert_eq!(controller.state(), PaginationState::Fallback);

        assert!(controller.set_auto_paginate(true));
        assert_eq!(controller.state(), PaginationState::Ready);
        assert_eq!(controller.pages().len(), 3);

        assert!(controller.set_auto_paginate(false));
        assert_eq!(controller.state(), PaginationState::Fallback);
        assert_eq!(controller.pages().len(), 2);
        assert_eq!(controller.version(), 3);
    }

    #[test]
    fn test_metrics_disappearing_falls_back() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(two_segment_doc());
        assert_eq!(controller.state(), PaginationState::Ready);

        probe.metrics.set(None);
        controller.refresh();
        assert_eq!(controller.state(), PaginationState::Fallback);
        assert_eq!(controller.pages().len(), 2);

        probe.metrics.set(Some(PageMetrics::new(300.0, 250.0, 24.0)));
        controller.refresh();
        assert_eq!(controller.state(), PaginationState::Ready);
    }

    #[test]
    fn test_render_error_is_contained_and_reported() {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe)
            .with_options(auto())
            .with_reporter(Box::new(move |err: &Error| {
                sink.borrow_mut().push(err.to_string())
            }));

        controller.set_document(Rc::new(Document::new(vec![
            sized(10.0),
            Block::page_break(None),
            Block::new("broken"),
        ])));

        assert_eq!(controller.state(), PaginationState::Failed);
        assert_eq!(controller.version(), 1);
        assert_eq!(controller.pages().len(), 2);
        assert!(controller.pages().pages.iter().all(|p| p.layout.is_none()));
        assert_eq!(reports.borrow().len(), 1);
        assert!(reports.borrow()[0].contains("no markup for broken"));

        controller.tick();
        assert_eq!(controller.state(), PaginationState::Fallback);
        controller.tick();
        assert_eq!(controller.state(), PaginationState::Fallback);
    }

    #[test]
    fn test_context_lost_mid_pass_falls_back_without_report() {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe)
            .with_options(auto())
            .with_reporter(Box::new(move |err: &Error| {
                sink.borrow_mut().push(err.to_string())
            }));

        controller.set_document(Rc::new(Document::new(vec![
            sized(10.0),
            Block::new("unmounted"),
        ])));

        assert_eq!(controller.state(), PaginationState::Fallback);
        assert_eq!(controller.pages().len(), 1);
        assert!(controller.pages().pages[0].layout.is_none());
        assert!(reports.borrow().is_empty());
    }

    #[test]
    fn test_renderer_panic_is_contained() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(Rc::new(Document::new(vec![
            sized(10.0),
            Block::new("explode"),
        ])));

        assert_eq!(controller.state(), PaginationState::Failed);
        assert_eq!(controller.pages().len(), 1);
        assert_eq!(controller.pages().pages[0].blocks().len(), 2);
    }

    #[test]
    fn test_recovers_after_failure() {
        let probe = Probe::with_metrics(250.0);
        let mut controller = controller(&probe).with_options(auto());
        controller.set_document(Rc::new(Document::new(vec![Block::new("broken")])));
        assert_eq!(controller.state(), PaginationState::Failed);

        controller.set_document(Rc::new(Document::new(vec![sized(10.0)])));
        assert_eq!(controller.state(), PaginationState::Ready);
        assert_eq!(controller.version(), 2);
    }

    #[test]
    fn test_paginate_with_plain_height_source() {
        let doc = Document::new(vec![sized(100.0), sized(100.0)]);
        let mut cache = SegmentCache::new();
        let mut heights = |b: &Block| -> Result<f32> {
            Ok(b.payload["height"].as_f64().unwrap_or(0.0) as f32)
        };
        let pages = paginate(&doc, PageMetrics::new(300.0, 250.0, 0.0), &mut heights, &mut cache)
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].layout.as_ref().unwrap().columns.as_slice(), &[0, 0]);
        assert_eq!(cache.len(), 1);

        // second pass over equal content is served from the cache
        let mut never = |_: &Block| -> Result<f32> { Err(Error::Measure("not cached".into())) };
        let again = paginate(&doc, PageMetrics::new(300.0, 250.0, 0.0), &mut never, &mut cache)
            .unwrap();
        assert_eq!(again, pages);
        assert_eq!(cache.stats(), (1, 0));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PaginationState::Ready.to_string(), "ready");
        assert_eq!(PaginationState::default(), PaginationState::Idle);
    }
}
