#![forbid(unsafe_code)]
//! vecta-core: shared vocabulary of the vectorized kernel.
//!
//! Data types and scalars, the physical element traits, fingerprint mixing,
//! the CPU capability snapshot, configuration, and the error taxonomy the
//! external executor sees. No buffers and no allocation policy live here.

pub mod budget;
pub mod caps;
pub mod config;
pub mod error;
pub mod hash;
pub mod native;
pub mod prelude;
pub mod scalar;
pub mod schema;
pub mod types;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
