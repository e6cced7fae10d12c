use thiserror::Error;

/// Canonical result for the kernel.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy surfaced to the external executor.
///
/// Only `OutOfMemory` is fatal; everything else is a typed, recoverable
/// result. "Not found" style outcomes are never errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Allocation failed or the memory budget is exhausted. Abort the query.
    #[error("out of memory: could not allocate {bytes} bytes (tag '{tag}')")]
    OutOfMemory { bytes: usize, tag: &'static str },

    /// No kernel for this operation/type combination. The caller may cast and retry.
    #[error("not implemented: {op} for ({left}, {right})")]
    NotImplemented {
        op: String,
        left: String,
        right: String,
    },

    /// Malformed external interchange input (import boundary only).
    #[error("interchange error: {0}")]
    Interchange(String),

    /// A caller-guaranteed invariant was detected as violated.
    #[error("contract violation: {0}")]
    Contract(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    pub fn not_implemented(
        op: impl Into<String>,
        left: impl std::fmt::Display,
        right: impl std::fmt::Display,
    ) -> Self {
        Error::NotImplemented {
            op: op.into(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Fatal errors terminate the current query instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::OutOfMemory { .. })
    }

    /// True for dispatch misses the executor can answer with a cast.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
