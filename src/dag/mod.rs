//! DAG Module - dependency ordering
//!
//! - `sort`: stable topological sort shared by documents and tasks
//!
//! Independent items never move; only items with declared relationships are
//! reordered.

mod sort;

pub use sort::sort;
