//! Pure layout: segment splitting and column packing

mod metrics;
mod pagination;
mod segment;

pub use metrics::{PageGeometry, PageMetrics};
pub use pagination::{
    manual_pages, pack_segment, pack_segments, ColumnLayout, Page, COLUMN_COUNT,
};
pub use segment::{split_segments, split_value, Segment};
