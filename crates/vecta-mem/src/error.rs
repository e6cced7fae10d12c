use thiserror::Error;

/// Result type local to vecta-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("memory budget exceeded for tag '{tag}': requested {requested} bytes, capacity {capacity}, used {used}")]
    BudgetExceeded {
        tag: &'static str,
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("allocation failed for {bytes} bytes (tag '{tag}')")]
    AllocFailed { tag: &'static str, bytes: usize },
}

impl Error {
    pub fn bytes(&self) -> usize {
        match self {
            Error::BudgetExceeded { requested, .. } => *requested,
            Error::AllocFailed { bytes, .. } => *bytes,
        }
    }
}

/// Both variants are out-of-memory conditions as far as the executor is concerned.
impl From<Error> for vecta_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::BudgetExceeded { tag, requested, .. } => vecta_core::Error::OutOfMemory {
                bytes: requested,
                tag,
            },
            Error::AllocFailed { tag, bytes } => vecta_core::Error::OutOfMemory { bytes, tag },
        }
    }
}
