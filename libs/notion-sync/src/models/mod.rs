//! Typed views over the records the Notion API sends and accepts.
//!
//! Both kinds of record wrap their payload under a key named after their type
//! tag, e.g. `{"type": "select", "select": {...}}`. The tag is classified into a
//! closed enum on decode, while the tag string itself is kept so the record can
//! be written back exactly as it came in, unknown types included.

use crate::NotionSyncError;

mod block;
mod property;

pub use block::{Block, BlockType, ChildNode};
pub use property::{PageProperty, PropertyType};

pub(crate) fn missing(kind: &'static str, field: &str) -> NotionSyncError {
    NotionSyncError::Decode {
        kind,
        field: field.to_string(),
    }
}

pub(crate) fn wrong_shape(
    kind: &'static str,
    field: &str,
    expected: &'static str,
) -> NotionSyncError {
    NotionSyncError::Shape {
        kind,
        field: field.to_string(),
        expected,
    }
}
