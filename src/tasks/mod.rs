//! Tasks Module - executors for task `type`s and template rendering
//!
//! - `executor`: TaskExecutor trait, TaskEnv, ExecuteOptions
//! - `registry`: ExecutorRegistry (type → executor)
//! - `render`: `{{ path }}` interpolation (Renderer trait, Interpolator)
//! - `write`, `mkdir`, `delete`, `exec`: built-in executors

mod delete;
mod exec;
mod executor;
mod mkdir;
mod registry;
mod render;
mod write;

pub use delete::DeleteExecutor;
pub use exec::ExecExecutor;
pub use executor::{task_failed, ExecuteOptions, TaskEnv, TaskExecutor};
pub use mkdir::MkdirExecutor;
pub use registry::ExecutorRegistry;
pub use render::{extract_refs, interpolate, Interpolator, Renderer};
pub use write::WriteExecutor;
