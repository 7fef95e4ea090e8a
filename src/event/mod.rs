//! Event Module - run lifecycle hooks and the event log
//!
//! Key types:
//! - `RunHooks`: callbacks the orchestrator fires (before/after task, errors, after all)
//! - `NoopHooks`: default, does nothing
//! - `HookChain`: fan-out to several hooks
//! - `EventLog`: thread-safe, append-only log implementing `RunHooks`

mod hooks;
mod log;

pub use hooks::{HookChain, NoopHooks, RunHooks};
pub use log::{Event, EventKind, EventLog};
