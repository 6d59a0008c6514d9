//! Connection lifecycle shared by both host strategies.
//!
//! `unconnected -> connecting -> connected -> accepted -> disconnected`.
//! `disconnected` is terminal; a host instance is single-use. Accessors need
//! `connected` or `accepted`; terminal actions need `accepted`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use activity_core::error::{ActivityError, Result};
use activity_core::protocol::envelope::{self, RequestInput};
use activity_core::protocol::ActivityRequest;

use crate::env::{DialogContext, SizeContainer};
use crate::resize::{ResizeCallback, Resizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Connected,
    Accepted,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Accepted)
    }

    pub fn is_accepted(self) -> bool {
        self == ConnectionState::Accepted
    }
}

/// Values cached when the handshake completes.
#[derive(Debug, Clone)]
pub struct Connection {
    pub request: ActivityRequest,
    pub request_string: String,
    pub target_origin: String,
    pub verified: bool,
    pub secure: bool,
    pub args: Option<Value>,
}

impl Connection {
    pub fn new(
        request: ActivityRequest,
        target_origin: String,
        verified: bool,
        secure: bool,
        args: Option<Value>,
    ) -> Result<Self> {
        let request_string = envelope::encode(&request)?;
        Ok(Self {
            request,
            request_string,
            target_origin,
            verified,
            secure,
            args,
        })
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    state: ConnectionState,
    conn: Option<Connection>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Unconnected,
            conn: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn begin_connect(&mut self) -> Result<()> {
        if self.state != ConnectionState::Unconnected {
            return Err(ActivityError::AlreadyConnected);
        }
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    pub fn mark_connected(&mut self, conn: Connection) -> Result<()> {
        if self.state != ConnectionState::Connecting {
            return Err(ActivityError::Internal(format!(
                "connected from state {:?}",
                self.state
            )));
        }
        self.conn = Some(conn);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    pub fn connection(&self) -> Result<&Connection> {
        if !self.state.is_connected() {
            return Err(ActivityError::NotConnected);
        }
        self.conn.as_ref().ok_or(ActivityError::NotConnected)
    }

    pub fn accept(&mut self) -> Result<()> {
        self.connection()?;
        self.state = ConnectionState::Accepted;
        Ok(())
    }

    pub fn accepted(&self) -> Result<&Connection> {
        if !self.state.is_accepted() {
            return Err(ActivityError::NotAccepted);
        }
        self.connection()
    }

    /// Returns false if the lifecycle was already disconnected.
    pub fn disconnect(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Disconnected;
        self.conn = None;
        true
    }
}

/// Resolve connect input, falling back to the dialog's own location fragment.
pub(crate) fn resolve_request(
    context: &dyn DialogContext,
    input: Option<RequestInput>,
) -> Result<ActivityRequest> {
    match input {
        Some(input) => envelope::decode(input),
        None => envelope::extract_from_location(&context.location())?.ok_or_else(|| {
            ActivityError::MalformedRequest("no request in location fragment".into())
        }),
    }
}

/// State and capabilities common to every strategy.
pub(crate) struct HostCore {
    pub(crate) context: Arc<dyn DialogContext>,
    pub(crate) resizer: Arc<Resizer>,
    lifecycle: Mutex<Lifecycle>,
}

impl HostCore {
    pub(crate) fn new(context: Arc<dyn DialogContext>, resizer: Arc<Resizer>) -> Self {
        Self {
            context,
            resizer,
            lifecycle: Mutex::new(Lifecycle::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Lifecycle>> {
        self.lifecycle
            .lock()
            .map_err(|_| ActivityError::Internal("lifecycle state poisoned".into()))
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.lock()
            .map(|lc| lc.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub(crate) fn begin_connect(&self) -> Result<()> {
        self.lock()?.begin_connect()
    }

    pub(crate) fn mark_connected(&self, conn: Connection) -> Result<()> {
        self.lock()?.mark_connected(conn)
    }

    pub(crate) fn request_string(&self) -> Result<String> {
        Ok(self.lock()?.connection()?.request_string.clone())
    }

    pub(crate) fn target_origin(&self) -> Result<String> {
        Ok(self.lock()?.connection()?.target_origin.clone())
    }

    pub(crate) fn is_target_origin_verified(&self) -> Result<bool> {
        Ok(self.lock()?.connection()?.verified)
    }

    pub(crate) fn is_secure_channel(&self) -> Result<bool> {
        Ok(self.lock()?.connection()?.secure)
    }

    pub(crate) fn args(&self) -> Result<Option<Value>> {
        Ok(self.lock()?.connection()?.args.clone())
    }

    pub(crate) fn accept(&self) -> Result<()> {
        self.lock()?.accept()
    }

    /// Snapshot of the connection, only once accepted.
    pub(crate) fn accepted(&self) -> Result<Connection> {
        Ok(self.lock()?.accepted()?.clone())
    }

    /// Returns true on the first call only.
    pub(crate) fn mark_disconnected(&self) -> bool {
        let first = match self.lifecycle.lock() {
            Ok(mut lc) => lc.disconnect(),
            Err(_) => false,
        };
        if first {
            self.resizer.cancel();
        }
        first
    }

    pub(crate) fn set_size_container(&self, container: Arc<dyn SizeContainer>) {
        self.resizer.set_size_container(container);
    }

    pub(crate) fn on_resize_complete(&self, callback: ResizeCallback) {
        self.resizer.on_resize_complete(callback);
    }

    pub(crate) fn resized(&self) {
        self.resizer.resized();
    }
}
