//! Utilities shared across modules

pub mod constants;

pub use constants::{CONNECT_TIMEOUT, EXEC_TIMEOUT, FETCH_TIMEOUT, REDIRECT_LIMIT, USER_AGENT};
