//! Top-level facade crate for the activity host.
//!
//! Re-exports the protocol core and the host runtime so users can depend on a single crate.

pub mod core {
    pub use activity_core::*;
}

pub mod host {
    pub use activity_host::*;
}
