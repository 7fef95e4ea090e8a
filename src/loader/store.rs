//! DocumentStore - fetch, parse, validate and cache configuration documents
//!
//! Each resolved location (absolute path or URL) is fetched and parsed at most
//! once per store. The cache is explicit state owned by the store; `clear()`
//! resets it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::ast::schema_validator::DocumentSchemaValidator;
use crate::ast::{is_valid_name, ConfigDocument, Source};
use crate::error::{KilnError, Result};

use super::fetch::Fetcher;

/// Loads documents by path or URL with a resolved-location cache
pub struct DocumentStore {
    /// Anchor for top-level relative references
    cwd: PathBuf,
    fetcher: Fetcher,
    /// Resolved location -> parsed document (write-once per key)
    cache: DashMap<String, Arc<ConfigDocument>>,
}

impl DocumentStore {
    /// Store resolving top-level references against `cwd`
    pub fn new(cwd: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_fetcher(cwd, Fetcher::new()?))
    }

    pub fn with_fetcher(cwd: impl Into<PathBuf>, fetcher: Fetcher) -> Self {
        Self {
            cwd: cwd.into(),
            fetcher,
            cache: DashMap::new(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Load a top-level reference (relative to the working directory)
    pub async fn load(&self, reference: &str) -> Result<Arc<ConfigDocument>> {
        self.load_from(reference, None).await
    }

    /// Load a reference made by the document at `base`
    pub async fn load_from(
        &self,
        reference: &str,
        base: Option<&Source>,
    ) -> Result<Arc<ConfigDocument>> {
        let source = self.resolve(reference, base)?;
        self.load_source(&source).await
    }

    /// Resolve a reference without loading it
    pub fn resolve(&self, reference: &str, base: Option<&Source>) -> Result<Source> {
        Source::resolve(reference, base, &self.cwd)
    }

    /// Load an already-resolved source, hitting the cache first
    #[instrument(skip(self), fields(source = %source))]
    pub async fn load_source(&self, source: &Source) -> Result<Arc<ConfigDocument>> {
        let key = source.key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("Document cache hit");
            return Ok(Arc::clone(cached.value()));
        }

        let text = self.fetcher.read(source).await?;
        let document = Arc::new(parse_document(&text, source)?);
        debug!(
            name = %document.name,
            tasks = document.tasks.len(),
            variables = document.variables.len(),
            prompts = document.prompts.len(),
            "Document loaded"
        );

        // Loading is sequential, so a concurrent insert for the same key cannot race
        self.cache.insert(key, Arc::clone(&document));
        Ok(document)
    }

    /// Whether a resolved location is cached
    pub fn contains(&self, source: &Source) -> bool {
        self.cache.contains_key(&source.key())
    }

    /// Number of cached documents
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached document
    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("cwd", &self.cwd)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Parse, validate and stamp a document read from `source`
///
/// Order of checks:
/// 1. payload parses (JSON, or YAML for `.yaml`/`.yml`) → `ParseError`
/// 2. `name` present and well-formed, `tasks` list-shaped → `SchemaError`
/// 3. full JSON Schema → `SchemaValidationFailed`
pub fn parse_document(text: &str, source: &Source) -> Result<ConfigDocument> {
    let source_ref = source.to_string();

    let value: Value = match source.extension().as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(text).map_err(|e| KilnError::ParseError {
                source_ref: source_ref.clone(),
                details: e.to_string(),
            })?
        }
        _ => serde_json::from_str(text).map_err(|e| KilnError::ParseError {
            source_ref: source_ref.clone(),
            details: e.to_string(),
        })?,
    };

    check_structure(&value, &source_ref)?;
    DocumentSchemaValidator::new()?.check(&source_ref, &value)?;

    let mut document: ConfigDocument =
        serde_json::from_value(value).map_err(|e| KilnError::ParseError {
            source_ref: source_ref.clone(),
            details: e.to_string(),
        })?;
    document.stamp_source(source);
    Ok(document)
}

/// Minimal structural invariants, reported before full schema validation
fn check_structure(value: &Value, source_ref: &str) -> Result<()> {
    let schema_error = |reason: String| KilnError::SchemaError {
        source_ref: source_ref.to_string(),
        reason,
    };

    let object = value
        .as_object()
        .ok_or_else(|| schema_error("document must be an object".to_string()))?;

    match object.get("name") {
        None => return Err(schema_error("missing `name`".to_string())),
        Some(Value::String(name)) if is_valid_name(name) => {}
        Some(Value::String(name)) => {
            return Err(schema_error(format!(
                "invalid name '{}' (expected lowercase letters, digits and single hyphens)",
                name
            )))
        }
        Some(_) => return Err(schema_error("`name` must be a string".to_string())),
    }

    if let Some(tasks) = object.get("tasks") {
        if !tasks.is_array() {
            return Err(schema_error("`tasks` must be an array".to_string()));
        }
    }

    Ok(())
}
