//! Merge Module - multi-document merge with override arbitration
//!
//! - `merger`: DocumentMerger (priority-ordered fold)
//! - `fields`: per-entity field reconciliation and exclusive field groups

mod fields;
mod merger;

pub use fields::{merge_config, Entity};
pub use merger::DocumentMerger;
