//! Popup strategy: live command channel with the opener.
//!
//! Handshake:
//! - Listen on the messenger and wait for the opener's `start`
//! - Race it against `connect_timeout`; on timeout hand over to redirect
//! - Acknowledge with `connect`, then serve commands until `close`
//!
//! Results do not disconnect. The opener answers `result` with `close` once
//! it has the outcome, and only then is the popup torn down.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use activity_core::error::{ActivityError, Result};
use activity_core::protocol::{ActivityResult, CommandKind, RequestInput};

use crate::config::{HostConfig, HostSection};
use crate::env::{ChannelTransport, DialogContext, SizeContainer};
use crate::host::{ActivityHost, ActivityMode, ConnectHost, HostHandle};
use crate::lifecycle::{resolve_request, Connection, ConnectionState, HostCore};
use crate::messenger::Messenger;
use crate::redirect::RedirectHost;
use crate::resize::{ResizeCallback, Resizer};

struct PopupShared {
    core: HostCore,
    messenger: Messenger,
    cfg: HostSection,
    /// Completed by the first `start`; carries its payload.
    handshake: Mutex<Option<oneshot::Sender<Option<Value>>>>,
}

impl PopupShared {
    fn handle_command(&self, cmd: CommandKind, payload: Option<Value>) {
        match cmd {
            CommandKind::Start => {
                let pending = self.handshake.lock().ok().and_then(|mut g| g.take());
                match pending {
                    Some(tx) => {
                        let _ = tx.send(payload);
                    }
                    None => tracing::debug!("ignoring start after handshake"),
                }
            }
            CommandKind::Close => {
                tracing::debug!("close received from opener");
                self.disconnect();
            }
            other => tracing::debug!(cmd = other.as_str(), "ignoring unexpected command"),
        }
    }

    fn disconnect(&self) {
        if !self.core.mark_disconnected() {
            return;
        }
        self.messenger.disconnect();
        if let Err(e) = self.core.context.terminate() {
            tracing::debug!(error = %e, "dialog termination failed");
        }
        tracing::info!(mode = "popup", "host disconnected");
    }

    fn send_result(&self, result: ActivityResult) -> Result<()> {
        let conn = self.core.accepted()?;
        tracing::info!(request_id = %conn.request.request_id, code = result.code.as_str(), "sending result");
        if let Err(e) = self
            .messenger
            .send_command(CommandKind::Result, Some(result.to_payload()))
        {
            tracing::warn!(error = %e, "result send failed");
        }
        Ok(())
    }
}

/// Host for a dialog opened as a popup.
pub struct PopupHost {
    shared: Arc<PopupShared>,
}

impl PopupHost {
    pub fn new(
        context: Arc<dyn DialogContext>,
        transport: Arc<dyn ChannelTransport>,
        cfg: &HostConfig,
    ) -> Self {
        let messenger = Messenger::new(transport, context.opener());
        let resizer = Resizer::new(Arc::clone(&context), cfg.host.resize_debounce());
        Self {
            shared: Arc::new(PopupShared {
                core: HostCore::new(context, resizer),
                messenger,
                cfg: cfg.host.clone(),
                handshake: Mutex::new(None),
            }),
        }
    }

    /// The channel this host speaks over.
    pub fn messenger(&self) -> &Messenger {
        &self.shared.messenger
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.core.state()
    }

    async fn fallback_to_redirect(&self, request_input: RequestInput) -> Result<HostHandle> {
        let redirect = RedirectHost::with_resizer(
            Arc::clone(&self.shared.core.context),
            Arc::clone(&self.shared.core.resizer),
        );
        redirect.connect(Some(request_input)).await
    }
}

#[async_trait]
impl ConnectHost for PopupHost {
    async fn connect(self, input: Option<RequestInput>) -> Result<HostHandle> {
        let request = resolve_request(self.shared.core.context.as_ref(), input)?;
        self.shared.core.begin_connect()?;

        let (tx, rx) = oneshot::channel();
        *self
            .shared
            .handshake
            .lock()
            .map_err(|_| ActivityError::Internal("handshake state poisoned".into()))? = Some(tx);

        let weak: Weak<PopupShared> = Arc::downgrade(&self.shared);
        self.shared.messenger.connect(Arc::new(move |cmd: CommandKind, payload: Option<Value>| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_command(cmd, payload);
            }
        }))?;

        let timeout = self.shared.cfg.connect_timeout();
        tracing::debug!(request_id = %request.request_id, timeout_ms = self.shared.cfg.connect_timeout_ms, "waiting for opener");

        let start_payload = tokio::select! {
            res = rx => res.map_err(|_| ActivityError::Internal("handshake abandoned".into()))?,
            _ = tokio::time::sleep(timeout) => {
                if let Ok(mut g) = self.shared.handshake.lock() {
                    g.take();
                }
                self.shared.messenger.disconnect();
                tracing::info!(
                    request_id = %request.request_id,
                    timeout_ms = self.shared.cfg.connect_timeout_ms,
                    "no start from opener; falling back to redirect"
                );
                return self.fallback_to_redirect(RequestInput::Request(request)).await;
            }
        };

        let peer = self.shared.messenger.peer()?;
        let args = start_payload.or_else(|| request.args.clone().map(Value::Object));
        let request_id = request.request_id.clone();
        let conn = Connection::new(request, peer.origin.clone(), peer.verified, peer.verified, args)?;

        if let Err(e) = self.shared.messenger.send_command(CommandKind::Connect, None) {
            tracing::warn!(error = %e, "connect acknowledgement failed");
        }
        self.shared.core.mark_connected(conn)?;
        tracing::info!(
            request_id = %request_id,
            origin = %peer.origin,
            verified = peer.verified,
            "popup host connected"
        );

        Ok(HostHandle::Popup(self))
    }
}

impl ActivityHost for PopupHost {
    fn mode(&self) -> ActivityMode {
        ActivityMode::Popup
    }

    fn request_string(&self) -> Result<String> {
        self.shared.core.request_string()
    }

    fn target_origin(&self) -> Result<String> {
        self.shared.core.target_origin()
    }

    fn is_target_origin_verified(&self) -> Result<bool> {
        self.shared.core.is_target_origin_verified()
    }

    /// Secure only when the peer is the opener itself.
    fn is_secure_channel(&self) -> Result<bool> {
        self.shared.core.is_secure_channel()
    }

    fn args(&self) -> Result<Option<Value>> {
        self.shared.core.args()
    }

    fn accept(&self) -> Result<()> {
        self.shared.core.accept()
    }

    fn ready(&self) -> Result<()> {
        self.shared.core.accepted()?;
        if let Err(e) = self.shared.messenger.send_command(CommandKind::Ready, None) {
            tracing::warn!(error = %e, "ready send failed");
        }
        Ok(())
    }

    fn result(&self, data: Value) -> Result<()> {
        self.shared.send_result(ActivityResult::ok(data))
    }

    fn cancel(&self) -> Result<()> {
        self.shared.send_result(ActivityResult::canceled())
    }

    fn failed(&self, error: &dyn fmt::Display) -> Result<()> {
        self.shared.send_result(ActivityResult::failed(error))
    }

    fn disconnect(&self) {
        self.shared.disconnect();
    }

    fn set_size_container(&self, container: Arc<dyn SizeContainer>) {
        self.shared.core.set_size_container(container);
    }

    fn on_resize_complete(&self, callback: ResizeCallback) {
        self.shared.core.on_resize_complete(callback);
    }

    fn resized(&self) {
        self.shared.core.resized();
    }
}
