//! Loader Module - documents from disk or network into one merged document
//!
//! - `fetch`: Fetcher (local file or http(s) GET)
//! - `store`: DocumentStore (parse, validate, stamp provenance, cache)
//! - `graph`: GraphLoader (extends walk, cycle detection, inherited enabled)
//!
//! [`resolve`] composes the pipeline: load graph → sort by `dependencies` →
//! merge in priority order.

mod fetch;
mod graph;
mod store;

pub use fetch::Fetcher;
pub use graph::GraphLoader;
pub use store::{parse_document, DocumentStore};

use tracing::{info, instrument};

use crate::ast::ConfigDocument;
use crate::dag;
use crate::error::Result;
use crate::merge::DocumentMerger;

/// Load, order and merge the graph rooted at `root_ref`
#[instrument(skip(store))]
pub async fn resolve(store: &DocumentStore, root_ref: &str) -> Result<ConfigDocument> {
    let documents = GraphLoader::new(store).load_graph(root_ref).await?;
    let ordered = dag::sort(
        documents,
        |doc: &ConfigDocument| doc.name.as_str(),
        |doc: &ConfigDocument| doc.dependencies.as_slice(),
    )?;

    let merged = DocumentMerger::new().merge(ordered)?;
    info!(
        name = %merged.name,
        tasks = merged.tasks.len(),
        variables = merged.variables.len(),
        prompts = merged.prompts.len(),
        "Configuration resolved"
    );
    Ok(merged)
}
