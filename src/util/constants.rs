//! Centralized constants for Kiln runtime configuration
//!
//! All timeout and limit values in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// Execution Timeouts
// ═══════════════════════════════════════════════════════════════

/// Timeout for external commands (exec/exec-file values, exec predicates, exec tasks)
pub const EXEC_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for fetching remote documents and remote file templates
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
// HTTP Client Limits
// ═══════════════════════════════════════════════════════════════

/// Maximum number of HTTP redirects to follow
pub const REDIRECT_LIMIT: usize = 5;

/// User agent sent with remote document requests
pub const USER_AGENT: &str = concat!("kiln/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════
