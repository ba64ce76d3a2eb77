//! Error taxonomy for the normalization engine.
//!
//! Every fallible entry point returns [`Result`]; nothing in this crate
//! panics in release builds except on internal invariant violations, which
//! are also checked with `debug_assert!` in debug builds so they fail fast
//! during development instead of silently corrupting state.

/// Errors the engine can report to its caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A [`crate::config::Config`] field was outside its documented range.
    /// Only ever produced while constructing a configuration; a config that
    /// has already been accepted can never become invalid later.
    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),

    /// A method was called while the engine was in a state that doesn't
    /// permit it (e.g. `process` before the first successful construction,
    /// or `process` after `flush` without an intervening `reset`).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An internal buffer had less data, or less free space, than an
    /// operation required. Indicates a bug in this crate's own pipeline
    /// bookkeeping rather than anything the caller did wrong.
    #[error("internal buffer insufficient: {0}")]
    BufferInsufficient(String),

    /// The attached analysis log sink failed a write. Logging is disabled
    /// for the remainder of the engine's lifetime after this is first
    /// reported; it is never propagated out of `process`/`flush`.
    #[error("log file unusable: {0}")]
    LogFileUnusable(#[source] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
