//! Custom extractors whose rejections render as problem responses.

pub mod json;
pub mod path_id;

pub use json::ValidJson;
pub use path_id::PositiveId;
