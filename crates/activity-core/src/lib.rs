//! Activity core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level contracts shared by the host runtime:
//! the activity request/result model, the direct-channel command envelope,
//! and the codec that moves requests and results through URL fragments.
//! It carries no async runtime dependency.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input
//! from an untrusted opener surfaces as `ActivityError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ActivityError, ErrorCode, Result};
