//! vecta-mem: buffers, validity bitmaps, fallible allocation, and the memory budget.
//!
//! This crate provides the concrete implementations for the *interfaces*
//! defined in `vecta-core::budget`, plus the two buffer representations every
//! vector is built from: kernel-owned memory and memory borrowed from an
//! external producer. Kernel outputs are allocated through `alloc` so a failed
//! allocation surfaces as an error rather than an abort.

pub mod alloc;
pub mod bitmap;
pub mod buffer;
pub mod error;
pub mod guard;
pub mod tracking;

pub use bitmap::{combine_validity, Bitmap, MutableBitmap};
pub use buffer::{Buffer, ForeignOwner, Ownership};
pub use error::{Error, Result};
pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};
pub use tracking::UsageSnapshot;
