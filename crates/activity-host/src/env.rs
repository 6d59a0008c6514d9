//! Capabilities the host borrows from its surrounding environment.
//!
//! The host never touches a window, a DOM, or a message port directly. The
//! embedding runtime provides these traits; tests provide in-memory fakes.

use std::sync::Arc;

use serde_json::Value;

use activity_core::error::Result;

/// Opaque handle to an execution context (a window, a frame, a worker).
///
/// Two handles are equal iff they designate the same context. Identity is
/// assigned by the embedding runtime and never derived from an origin string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextRef(u64);

impl ContextRef {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Message as delivered by the raw transport, before any filtering.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Sending context, when the transport can tell.
    pub source: Option<ContextRef>,
    /// Origin claimed for the sender.
    pub origin: String,
    /// Structured payload.
    pub data: Value,
}

/// Inbound message callback registered with a transport.
pub type MessageHandler = Arc<dyn Fn(RawMessage) + Send + Sync>;

/// Live subscription returned by [`ChannelTransport::subscribe`].
pub trait Subscription: Send {
    /// Stop delivering messages. May fail if the transport is already gone.
    fn unsubscribe(&mut self) -> Result<()>;
}

/// Bidirectional message transport between contexts (e.g. `postMessage`).
pub trait ChannelTransport: Send + Sync {
    /// Post `message` to `target`, restricted to `target_origin`.
    fn send(&self, message: Value, target: &ContextRef, target_origin: &str) -> Result<()>;

    /// Start delivering inbound messages to `handler`.
    fn subscribe(&self, handler: MessageHandler) -> Box<dyn Subscription>;
}

/// The dialog's own execution context.
pub trait DialogContext: Send + Sync {
    /// Current location, including the fragment.
    fn location(&self) -> String;

    /// Origin of this context.
    fn origin(&self) -> String;

    /// Handle to the context that opened this one, if it is still reachable.
    fn opener(&self) -> Option<ContextRef>;

    /// Display size currently available to the dialog.
    fn available_size(&self) -> u32;

    /// One-way navigation of this context to `url`.
    fn navigate(&self, url: &str) -> Result<()>;

    /// Close this context. Best-effort.
    fn terminate(&self) -> Result<()>;
}

/// Element whose content size the dialog wants to be shown at.
pub trait SizeContainer: Send + Sync {
    fn requested_size(&self) -> u32;
}
