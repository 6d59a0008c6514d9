//! Host contract shared by the popup and redirect strategies.
//!
//! `connect` consumes the instance it is called on and resolves to a
//! [`HostHandle`]. The handle's variant is authoritative: a popup whose opener
//! never answered comes back as `HostHandle::Redirect`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use activity_core::error::Result;
use activity_core::protocol::RequestInput;

use crate::config::HostConfig;
use crate::env::{ChannelTransport, DialogContext, SizeContainer};
use crate::popup::PopupHost;
use crate::redirect::RedirectHost;
use crate::resize::ResizeCallback;

/// Which transport strategy is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityMode {
    Popup,
    Redirect,
}

impl ActivityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityMode::Popup => "popup",
            ActivityMode::Redirect => "redirect",
        }
    }
}

/// Operations available on a host once constructed.
pub trait ActivityHost: Send + Sync {
    fn mode(&self) -> ActivityMode;

    /// Encoded form of the request being served.
    fn request_string(&self) -> Result<String>;
    /// Origin of the caller.
    fn target_origin(&self) -> Result<String>;
    fn is_target_origin_verified(&self) -> Result<bool>;
    fn is_secure_channel(&self) -> Result<bool>;
    fn args(&self) -> Result<Option<Value>>;

    fn accept(&self) -> Result<()>;
    fn ready(&self) -> Result<()>;
    fn result(&self, data: Value) -> Result<()>;
    fn cancel(&self) -> Result<()>;
    fn failed(&self, error: &dyn fmt::Display) -> Result<()>;

    /// Release the connection. Never fails.
    fn disconnect(&self);

    fn set_size_container(&self, container: Arc<dyn SizeContainer>);
    fn on_resize_complete(&self, callback: ResizeCallback);
    fn resized(&self);
}

/// Handshake entry point. Consumes the unconnected host.
#[async_trait]
pub trait ConnectHost: Sized {
    /// With no input the request is read from the dialog's location fragment.
    async fn connect(self, input: Option<RequestInput>) -> Result<HostHandle>;
}

/// Connected host, tagged by the strategy that ended up live.
pub enum HostHandle {
    Popup(PopupHost),
    Redirect(RedirectHost),
}

impl HostHandle {
    pub fn as_popup(&self) -> Option<&PopupHost> {
        match self {
            HostHandle::Popup(h) => Some(h),
            HostHandle::Redirect(_) => None,
        }
    }

    pub fn as_redirect(&self) -> Option<&RedirectHost> {
        match self {
            HostHandle::Redirect(h) => Some(h),
            HostHandle::Popup(_) => None,
        }
    }

    fn inner(&self) -> &dyn ActivityHost {
        match self {
            HostHandle::Popup(h) => h as &dyn ActivityHost,
            HostHandle::Redirect(h) => h as &dyn ActivityHost,
        }
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostHandle").field(&self.mode()).finish()
    }
}

impl ActivityHost for HostHandle {
    fn mode(&self) -> ActivityMode {
        self.inner().mode()
    }
    fn request_string(&self) -> Result<String> {
        self.inner().request_string()
    }
    fn target_origin(&self) -> Result<String> {
        self.inner().target_origin()
    }
    fn is_target_origin_verified(&self) -> Result<bool> {
        self.inner().is_target_origin_verified()
    }
    fn is_secure_channel(&self) -> Result<bool> {
        self.inner().is_secure_channel()
    }
    fn args(&self) -> Result<Option<Value>> {
        self.inner().args()
    }
    fn accept(&self) -> Result<()> {
        self.inner().accept()
    }
    fn ready(&self) -> Result<()> {
        self.inner().ready()
    }
    fn result(&self, data: Value) -> Result<()> {
        self.inner().result(data)
    }
    fn cancel(&self) -> Result<()> {
        self.inner().cancel()
    }
    fn failed(&self, error: &dyn fmt::Display) -> Result<()> {
        self.inner().failed(error)
    }
    fn disconnect(&self) {
        self.inner().disconnect()
    }
    fn set_size_container(&self, container: Arc<dyn SizeContainer>) {
        self.inner().set_size_container(container)
    }
    fn on_resize_complete(&self, callback: ResizeCallback) {
        self.inner().on_resize_complete(callback)
    }
    fn resized(&self) {
        self.inner().resized()
    }
}

/// Unconnected host with its strategy chosen from the dialog's environment.
pub enum HostStrategy {
    Popup(PopupHost),
    Redirect(RedirectHost),
}

impl HostStrategy {
    /// Popup when the dialog still holds a reference to its opener, redirect otherwise.
    pub fn discover(
        context: Arc<dyn DialogContext>,
        transport: Arc<dyn ChannelTransport>,
        cfg: &HostConfig,
    ) -> Self {
        if context.opener().is_some() {
            HostStrategy::Popup(PopupHost::new(context, transport, cfg))
        } else {
            HostStrategy::Redirect(RedirectHost::new(context, cfg))
        }
    }

    pub fn mode(&self) -> ActivityMode {
        match self {
            HostStrategy::Popup(_) => ActivityMode::Popup,
            HostStrategy::Redirect(_) => ActivityMode::Redirect,
        }
    }

    pub fn set_size_container(&self, container: Arc<dyn SizeContainer>) {
        match self {
            HostStrategy::Popup(h) => h.set_size_container(container),
            HostStrategy::Redirect(h) => h.set_size_container(container),
        }
    }

    pub fn on_resize_complete(&self, callback: ResizeCallback) {
        match self {
            HostStrategy::Popup(h) => h.on_resize_complete(callback),
            HostStrategy::Redirect(h) => h.on_resize_complete(callback),
        }
    }
}

#[async_trait]
impl ConnectHost for HostStrategy {
    async fn connect(self, input: Option<RequestInput>) -> Result<HostHandle> {
        tracing::debug!(mode = self.mode().as_str(), "connecting host");
        match self {
            HostStrategy::Popup(h) => h.connect(input).await,
            HostStrategy::Redirect(h) => h.connect(input).await,
        }
    }
}

/// Discover the strategy for this dialog and run the handshake.
pub async fn connect_host(
    context: Arc<dyn DialogContext>,
    transport: Arc<dyn ChannelTransport>,
    cfg: &HostConfig,
    input: Option<RequestInput>,
) -> Result<HostHandle> {
    HostStrategy::discover(context, transport, cfg)
        .connect(input)
        .await
}
