//! Protocol modules (direct channel + navigation channel).
//!
//! This module hosts the two wire formats a dialog host speaks:
//! - Direct channel: sentinel-tagged JSON command envelopes.
//! - Navigation channel: JSON requests/results carried in URL fragments.
//!
//! All parsers are panic-free: malformed input from the opener is reported as
//! `ActivityError` instead of panicking, keeping the host resilient to hostile
//! traffic.

pub mod command;
pub mod envelope;
pub mod request;

pub use command::{Command, CommandKind, SENTINEL};
pub use envelope::{RequestInput, ResultEnvelope};
pub use request::{ActivityRequest, ActivityResult, ResultCode};
