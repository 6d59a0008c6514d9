//! Redirect strategy: the dialog is a full navigation with no live channel.
//!
//! The request arrives in the location fragment and the result leaves by
//! navigating back to `returnUrl`. There is no peer to authenticate, so the
//! channel is never verified. `disconnect` never closes the context: the
//! context is the caller's own tab.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use activity_core::error::Result;
use activity_core::protocol::envelope::{build_result_url, origin_of};
use activity_core::protocol::{ActivityResult, RequestInput};

use crate::config::HostConfig;
use crate::env::{DialogContext, SizeContainer};
use crate::host::{ActivityHost, ActivityMode, ConnectHost, HostHandle};
use crate::lifecycle::{resolve_request, Connection, ConnectionState, HostCore};
use crate::resize::{ResizeCallback, Resizer};

/// Host for a dialog reached by navigation.
pub struct RedirectHost {
    core: HostCore,
}

impl RedirectHost {
    pub fn new(context: Arc<dyn DialogContext>, cfg: &HostConfig) -> Self {
        let resizer = Resizer::new(Arc::clone(&context), cfg.host.resize_debounce());
        Self::with_resizer(context, resizer)
    }

    /// Continue with an existing resizer (popup fallback keeps its size wiring).
    pub(crate) fn with_resizer(context: Arc<dyn DialogContext>, resizer: Arc<Resizer>) -> Self {
        Self {
            core: HostCore::new(context, resizer),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.core.state()
    }

    fn send_result(&self, result: ActivityResult) -> Result<()> {
        let conn = self.core.accepted()?;
        let url = build_result_url(
            &conn.request.return_url,
            &conn.request.request_id,
            &self.core.context.origin(),
            &result,
        )?;
        tracing::info!(request_id = %conn.request.request_id, code = result.code.as_str(), "redirecting with result");
        if let Err(e) = self.core.context.navigate(&url) {
            tracing::warn!(error = %e, "result navigation failed");
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectHost for RedirectHost {
    async fn connect(self, input: Option<RequestInput>) -> Result<HostHandle> {
        let request = resolve_request(self.core.context.as_ref(), input)?;
        let target_origin = origin_of(&request.return_url)?;
        self.core.begin_connect()?;

        let request_id = request.request_id.clone();
        let args = request.args.clone().map(Value::Object);
        let conn = Connection::new(request, target_origin.clone(), false, false, args)?;
        self.core.mark_connected(conn)?;
        tracing::info!(request_id = %request_id, origin = %target_origin, "redirect host connected");

        Ok(HostHandle::Redirect(self))
    }
}

impl ActivityHost for RedirectHost {
    fn mode(&self) -> ActivityMode {
        ActivityMode::Redirect
    }

    fn request_string(&self) -> Result<String> {
        self.core.request_string()
    }

    fn target_origin(&self) -> Result<String> {
        self.core.target_origin()
    }

    fn is_target_origin_verified(&self) -> Result<bool> {
        self.core.is_target_origin_verified()
    }

    fn is_secure_channel(&self) -> Result<bool> {
        self.core.is_secure_channel()
    }

    fn args(&self) -> Result<Option<Value>> {
        self.core.args()
    }

    fn accept(&self) -> Result<()> {
        self.core.accept()
    }

    fn ready(&self) -> Result<()> {
        // No channel to signal over until the final navigation.
        self.core.accepted().map(|_| ())
    }

    fn result(&self, data: Value) -> Result<()> {
        self.send_result(ActivityResult::ok(data))
    }

    fn cancel(&self) -> Result<()> {
        self.send_result(ActivityResult::canceled())
    }

    fn failed(&self, error: &dyn fmt::Display) -> Result<()> {
        self.send_result(ActivityResult::failed(error))
    }

    fn disconnect(&self) {
        if self.core.mark_disconnected() {
            tracing::info!(mode = "redirect", "host disconnected");
        }
    }

    fn set_size_container(&self, container: Arc<dyn SizeContainer>) {
        self.core.set_size_container(container);
    }

    fn on_resize_complete(&self, callback: ResizeCallback) {
        self.core.on_resize_complete(callback);
    }

    fn resized(&self) {
        self.core.resized();
    }
}
