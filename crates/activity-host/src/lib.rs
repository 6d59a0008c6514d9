//! Activity host library entry.
//!
//! This crate runs the dialog side of an activity: it resolves the request,
//! completes the handshake with the opener over a live channel or by
//! navigation, and delivers the result. Window, DOM and transport access come
//! in through the traits in [`env`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod env;
pub mod host;
pub mod lifecycle;
pub mod messenger;
pub mod popup;
pub mod redirect;
pub mod resize;

pub use host::{connect_host, ActivityHost, ActivityMode, ConnectHost, HostHandle, HostStrategy};
pub use popup::PopupHost;
pub use redirect::RedirectHost;
