//! Channel Messenger: typed command protocol over a raw bidirectional transport.
//!
//! Responsibilities:
//! - Tag outgoing commands with the protocol sentinel
//! - Drop inbound traffic that is not ours, or not from the bound peer
//! - Bind the peer identity exactly once, on the first `start`
//! - Report whether that peer is provably the opener (reference equality only)
//!
//! A `start` without a source reference is dropped: there is nothing to reply
//! to. Transports that never fill `RawMessage::source` therefore never bind a
//! peer, and a popup host on such a transport always falls back to redirect.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use activity_core::error::{ActivityError, Result};
use activity_core::protocol::{Command, CommandKind};

use crate::env::{ChannelTransport, ContextRef, MessageHandler, RawMessage, Subscription};

/// Callback receiving every accepted command, in delivery order.
pub type CommandHandler = Arc<dyn Fn(CommandKind, Option<Value>) + Send + Sync>;

/// Identity of the caller, captured from its first `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub target: ContextRef,
    pub origin: String,
    /// True only when `target` is the trusted opener handle.
    pub verified: bool,
}

/// One-way binding: `Unbound -> Bound`, never rebound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PeerBinding {
    #[default]
    Unbound,
    Bound(PeerIdentity),
}

#[derive(Default)]
struct MessengerState {
    peer: PeerBinding,
    on_command: Option<CommandHandler>,
    subscription: Option<Box<dyn Subscription>>,
}

struct MessengerShared {
    transport: Arc<dyn ChannelTransport>,
    trusted: Option<ContextRef>,
    state: Mutex<MessengerState>,
}

/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct Messenger {
    shared: Arc<MessengerShared>,
}

impl Messenger {
    /// `trusted` is the handle a verified peer must match (normally the opener).
    pub fn new(transport: Arc<dyn ChannelTransport>, trusted: Option<ContextRef>) -> Self {
        Self {
            shared: Arc::new(MessengerShared {
                transport,
                trusted,
                state: Mutex::new(MessengerState::default()),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MessengerState>> {
        self.shared
            .state
            .lock()
            .map_err(|_| ActivityError::Internal("messenger state poisoned".into()))
    }

    /// Start listening. Does not wait for the peer.
    pub fn connect(&self, on_command: CommandHandler) -> Result<()> {
        {
            let mut st = self.lock()?;
            if st.subscription.is_some() {
                tracing::debug!("messenger already listening");
                return Ok(());
            }
            st.on_command = Some(on_command);
        }

        // Subscribe outside the lock: a transport may deliver queued messages synchronously.
        let weak = Arc::downgrade(&self.shared);
        let handler: MessageHandler = Arc::new(move |raw: RawMessage| {
            if let Some(shared) = weak.upgrade() {
                Messenger { shared }.handle_event(raw);
            }
        });
        let sub = self.shared.transport.subscribe(handler);

        self.lock()?.subscription = Some(sub);
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.lock().map(|st| st.on_command.is_some()).unwrap_or(false)
    }

    pub fn peer(&self) -> Result<PeerIdentity> {
        match &self.lock()?.peer {
            PeerBinding::Bound(p) => Ok(p.clone()),
            PeerBinding::Unbound => Err(ActivityError::NotConnected),
        }
    }

    pub fn target(&self) -> Result<ContextRef> {
        self.peer().map(|p| p.target)
    }

    pub fn target_origin(&self) -> Result<String> {
        self.peer().map(|p| p.origin)
    }

    pub fn is_verified(&self) -> Result<bool> {
        self.peer().map(|p| p.verified)
    }

    /// Post a tagged command to the bound peer. No acknowledgement is awaited.
    pub fn send_command(&self, cmd: CommandKind, payload: Option<Value>) -> Result<()> {
        let peer = self.peer()?;
        let msg = Command::new(cmd, payload).to_message();
        tracing::trace!(cmd = cmd.as_str(), origin = %peer.origin, "send command");
        self.shared.transport.send(msg, &peer.target, &peer.origin)
    }

    /// Filter one inbound transport message and dispatch it.
    pub fn handle_event(&self, raw: RawMessage) {
        let Some(command) = Command::from_message(&raw.data) else {
            tracing::trace!(origin = %raw.origin, "dropping non-protocol message");
            return;
        };

        let handler = {
            let Ok(mut st) = self.shared.state.lock() else {
                return;
            };
            if st.on_command.is_none() {
                tracing::trace!(cmd = command.cmd.as_str(), "dropping command, not listening");
                return;
            }

            let bound = match &st.peer {
                PeerBinding::Bound(peer) => Some((peer.target, peer.origin.clone())),
                PeerBinding::Unbound => None,
            };
            match bound {
                Some((target, origin)) => {
                    if raw.source != Some(target) || raw.origin != origin {
                        tracing::trace!(origin = %raw.origin, cmd = command.cmd.as_str(), "dropping command from foreign source");
                        return;
                    }
                }
                None => {
                    if command.cmd != CommandKind::Start {
                        tracing::trace!(cmd = command.cmd.as_str(), "dropping command before start");
                        return;
                    }
                    let Some(source) = raw.source else {
                        tracing::trace!(origin = %raw.origin, "dropping start without source reference");
                        return;
                    };
                    let verified = self.shared.trusted == Some(source);
                    tracing::debug!(origin = %raw.origin, verified, "peer bound");
                    st.peer = PeerBinding::Bound(PeerIdentity {
                        target: source,
                        origin: raw.origin.clone(),
                        verified,
                    });
                }
            }
            st.on_command.clone()
        };

        // Dispatch unlocked: the handler may disconnect us.
        if let Some(handler) = handler {
            handler(command.cmd, command.payload);
        }
    }

    /// Stop listening. Idempotent; unsubscribe failures are absorbed.
    pub fn disconnect(&self) {
        let sub = match self.shared.state.lock() {
            Ok(mut st) => {
                st.on_command = None;
                st.subscription.take()
            }
            Err(_) => None,
        };
        if let Some(mut sub) = sub {
            if let Err(e) = sub.unsubscribe() {
                tracing::debug!(error = %e, "unsubscribe failed");
            }
        }
    }
}
