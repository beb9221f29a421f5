//! Two-column page packing
//!
//! Blocks are placed strictly in input order with a first-fit rule: column 0
//! of the current page, then column 1, then a fresh page. A block is never
//! split; one taller than a column occupies column 0 of a page on its own and
//! the column is treated as full.

use crate::document::{Block, Document, PageBreakAttrs};
use crate::error::{Error, Result};
use crate::layout::metrics::PageMetrics;
use crate::layout::segment::Segment;
use crate::measure::BlockHeights;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of columns on a page
pub const COLUMN_COUNT: usize = 2;

/// Where each block of a packed page landed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    /// Column index (0 or 1) per block, parallel to the page content
    pub columns: SmallVec<[u8; 16]>,
    /// Height consumed in each column
    pub used: [f32; COLUMN_COUNT],
}

impl ColumnLayout {
    /// Indices of the blocks placed in `column`
    pub fn blocks_in(&self, column: u8) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == column)
            .map(|(idx, _)| idx)
    }
}

/// One output page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub doc: Document,
    pub attrs: Option<PageBreakAttrs>,
    /// Column assignment; absent on manually split pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<ColumnLayout>,
}

impl Page {
    /// A page with no content (an intentional blank page)
    pub fn blank(attrs: Option<PageBreakAttrs>) -> Self {
        Self {
            doc: Document::default(),
            attrs,
            layout: None,
        }
    }

    /// A page holding a whole segment, unpacked
    pub fn from_segment(segment: &Segment) -> Self {
        Self {
            doc: Document::new(segment.blocks.clone()),
            attrs: segment.attrs.clone(),
            layout: None,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.doc.content
    }

    pub fn is_blank(&self) -> bool {
        self.doc.content.is_empty()
    }
}

/// Page under construction
struct PageAccumulator {
    blocks: Vec<Block>,
    columns: SmallVec<[u8; 16]>,
    remaining: [f32; COLUMN_COUNT],
}

impl PageAccumulator {
    fn new(column_height: f32) -> Self {
        Self {
            blocks: Vec::new(),
            columns: SmallVec::new(),
            remaining: [column_height; COLUMN_COUNT],
        }
    }

    fn push(&mut self, block: Block, column: u8, height: f32) {
        self.remaining[column as usize] -= height;
        self.columns.push(column);
        self.blocks.push(block);
    }
}

/// Packing state for one segment
struct SegmentPacker {
    attrs: Option<PageBreakAttrs>,
    column_height: f32,
    current: PageAccumulator,
    pages: Vec<Page>,
}

impl SegmentPacker {
    fn new(attrs: Option<PageBreakAttrs>, column_height: f32) -> Self {
        Self {
            attrs,
            column_height,
            current: PageAccumulator::new(column_height),
            pages: Vec::new(),
        }
    }

    fn place(&mut self, block: Block, height: f32) {
        if height <= self.current.remaining[0] {
            self.current.push(block, 0, height);
        } else if height <= self.current.remaining[1] {
            self.current.push(block, 1, height);
        } else {
            if !self.current.blocks.is_empty() {
                self.flush();
            }
            // Oversized blocks fill column 0 but never go below zero
            self.current.push(block, 0, height.min(self.column_height));
        }
    }

    fn flush(&mut self) {
        let page = std::mem::replace(&mut self.current, PageAccumulator::new(self.column_height));
        let used = [
            self.column_height - page.remaining[0],
            self.column_height - page.remaining[1],
        ];
        // Only the first page of a segment carries the break's attrs
        let attrs = self.attrs.take();
        self.pages.push(Page {
            doc: Document::new(page.blocks),
            attrs,
            layout: Some(ColumnLayout {
                columns: page.columns,
                used,
            }),
        });
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.blocks.is_empty() {
            self.flush();
        }
        self.pages
    }
}

/// Pack one segment into pages.
///
/// Heights come from `heights`, queried once per block in order. Errors from
/// the height source are returned as-is; nothing is caught here.
pub fn pack_segment<H>(segment: &Segment, metrics: &PageMetrics, heights: &mut H) -> Result<Vec<Page>>
where
    H: BlockHeights + ?Sized,
{
    if segment.is_empty() {
        return Ok(vec![Page::blank(segment.attrs.clone())]);
    }
    if !metrics.is_usable() {
        return Err(Error::Packing(format!(
            "unusable column size {}x{}",
            metrics.column_width, metrics.column_height
        )));
    }

    let mut packer = SegmentPacker::new(segment.attrs.clone(), metrics.column_height);
    for block in &segment.blocks {
        let height = heights.block_height(block)?;
        if !height.is_finite() || height < 0.0 {
            return Err(Error::Measure(format!(
                "invalid height {} for `{}` block",
                height, block.kind
            )));
        }
        packer.place(block.clone(), height);
    }

    Ok(packer.finish())
}

/// Pack every segment and concatenate the pages
pub fn pack_segments<H>(segments: &[Segment], metrics: &PageMetrics, heights: &mut H) -> Result<Vec<Page>>
where
    H: BlockHeights + ?Sized,
{
    let mut pages = Vec::with_capacity(segments.len());
    for segment in segments {
        pages.extend(pack_segment(segment, metrics, heights)?);
    }
    Ok(pages)
}

/// Manual-break pages: exactly one page per segment, content untouched
pub fn manual_pages(segments: &[Segment]) -> Vec<Page> {
    segments.iter().map(Page::from_segment).collect()
}
