//! Height estimation without a browser
//!
//! Used by the CLI, benches and server-side previews. Heights are an
//! approximation from font metrics and line breaking; the browser oracle
//! remains the source of truth for what the author sees.

use crate::config::PaginationOptions;
use crate::document::{Block, BlockKind};
use crate::error::Result;
use crate::layout::{PageGeometry, PageMetrics};
use crate::measure::font::FontMetrics;
use crate::measure::line_break::LineBreaker;
use crate::measure::{round_height, BlockRenderer, MeasurementOracle};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Elements the parser adds around a fragment
const WRAPPER_TAGS: &[&str] = &["html", "head", "body"];

/// Elements whose text is never rendered
const SKIPPED_TAGS: &[&str] = &["script", "style", "template"];

/// Tags whose end starts a new line of text
const LINE_ENDING_TAGS: &[&str] = &[
    "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
];

/// Oracle that estimates heights from font metrics
#[derive(Debug, Clone)]
pub struct HeadlessOracle {
    geometry: PageGeometry,
    font: FontMetrics,
    column_gap: f32,
    row_gap: f32,
    breaker: LineBreaker,
}

impl Default for HeadlessOracle {
    fn default() -> Self {
        Self::new(PageGeometry::default(), FontMetrics::default())
    }
}

impl HeadlessOracle {
    pub fn new(geometry: PageGeometry, font: FontMetrics) -> Self {
        let defaults = PaginationOptions::default();
        Self {
            geometry,
            font,
            column_gap: defaults.column_gap,
            row_gap: defaults.row_gap,
            breaker: LineBreaker::new(),
        }
    }

    pub fn with_options(mut self, options: &PaginationOptions) -> Self {
        self.apply_options(options);
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn metrics(&self) -> PageMetrics {
        self.geometry.metrics(self.column_gap)
    }
}

impl MeasurementOracle for HeadlessOracle {
    fn compute_metrics(&self) -> Option<PageMetrics> {
        Some(self.metrics()).filter(PageMetrics::is_usable)
    }

    fn measure_block_height(&self, markup: &str) -> Result<f32> {
        let (kind, text) = parse_markup(markup);
        let line_height = self.font.line_height * kind.line_height_multiplier();
        let lines = self
            .breaker
            .line_count(&text, self.metrics().column_width, &self.font);
        let raw = lines as f32 * line_height + self.row_gap;
        Ok(round_height(raw as f64))
    }

    fn apply_options(&mut self, options: &PaginationOptions) {
        self.column_gap = options.column_gap;
        self.row_gap = options.row_gap.max(0.0);
    }
}

/// Split markup into the kind of its outermost element and its plain text
fn parse_markup(markup: &str) -> (BlockKind, String) {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);

    let mut outer = None;
    let mut text = String::with_capacity(markup.len());
    collect_text(&dom.document, &mut outer, &mut text);
    let trimmed = text.trim_end_matches('\n').to_string();

    let kind = match outer.as_deref() {
        Some("p") | None => BlockKind::Paragraph,
        Some(tag) => match tag.strip_prefix('h').and_then(|l| l.parse::<u8>().ok()) {
            Some(level @ 1..=6) => BlockKind::Heading { level },
            _ => BlockKind::Other(tag.to_string()),
        },
    };

    (kind, trimmed)
}

/// Depth-first text collection; records the first content element seen
fn collect_text(handle: &Handle, outer: &mut Option<String>, text: &mut String) {
    let mut ends_line = false;
    match &handle.data {
        NodeData::Document => {}
        NodeData::Text { contents } => {
            text.push_str(&contents.borrow());
            return;
        }
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if SKIPPED_TAGS.contains(&tag) {
                return;
            }
            if outer.is_none() && !WRAPPER_TAGS.contains(&tag) {
                *outer = Some(tag.to_string());
            }
            if tag == "br" {
                text.push('\n');
            }
            ends_line = LINE_ENDING_TAGS.contains(&tag);
        }
        _ => return,
    }

    for child in handle.children.borrow().iter() {
        collect_text(child, outer, text);
    }
    if ends_line {
        text.push('\n');
    }
}

/// Minimal block-to-markup converter for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupRenderer;

impl BlockRenderer for MarkupRenderer {
    fn render_block(&self, block: &Block) -> Result<String> {
        let text = block.text();
        let text = html_escape::encode_text(&text);
        let markup = match block.block_kind() {
            BlockKind::Paragraph => format!("<p>{}</p>", text),
            BlockKind::Heading { level } => format!("<h{0}>{1}</h{0}>", level, text),
            BlockKind::PageBreak => String::new(),
            BlockKind::Other(kind) => format!(
                "<div data-type=\"{}\">{}</div>",
                html_escape::encode_double_quoted_attribute(&kind),
                text
            ),
        };
        Ok(markup)
    }
}
