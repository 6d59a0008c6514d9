//! In-memory environment shared by host integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use activity_core::error::{ActivityError, Result};
use activity_core::protocol::{ActivityRequest, SENTINEL};
use activity_host::env::{
    ChannelTransport, ContextRef, DialogContext, MessageHandler, RawMessage, SizeContainer,
    Subscription,
};

pub const OPENER: ContextRef = ContextRef::new(1);
pub const STRANGER: ContextRef = ContextRef::new(99);
pub const PUB_ORIGIN: &str = "https://example-pub.com";
pub const DIALOG_ORIGIN: &str = "https://dialog.example";

pub fn request() -> ActivityRequest {
    let mut args = Map::new();
    args.insert("a".into(), json!(1));
    ActivityRequest::new("request1", "https://example-pub.com/opener").with_args(args)
}

pub fn command_from(source: Option<ContextRef>, origin: &str, cmd: &str, payload: Option<Value>) -> RawMessage {
    let mut data = json!({ "sentinel": SENTINEL, "cmd": cmd });
    if let Some(p) = payload {
        data["payload"] = p;
    }
    RawMessage {
        source,
        origin: origin.to_string(),
        data,
    }
}

pub fn opener_command(cmd: &str, payload: Option<Value>) -> RawMessage {
    command_from(Some(OPENER), PUB_ORIGIN, cmd, payload)
}

// --------------------
// Transport
// --------------------
#[derive(Debug, Clone)]
pub struct Sent {
    pub message: Value,
    pub target: ContextRef,
    pub target_origin: String,
}

type Handlers = Arc<Mutex<Vec<(u64, MessageHandler)>>>;

#[derive(Default)]
pub struct FakeTransport {
    handlers: Handlers,
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicU64,
    pub fail_send: AtomicBool,
    pub fail_unsubscribe: Arc<AtomicBool>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver to every live subscriber, in subscription order.
    pub fn deliver(&self, msg: RawMessage) {
        let handlers: Vec<MessageHandler> =
            self.handlers.lock().unwrap().iter().map(|(_, h)| Arc::clone(h)).collect();
        for h in handlers {
            h(msg.clone());
        }
    }

    pub fn subscribers(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_cmds(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|s| s.message["cmd"].as_str().unwrap().to_string())
            .collect()
    }
}

impl ChannelTransport for FakeTransport {
    fn send(&self, message: Value, target: &ContextRef, target_origin: &str) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ActivityError::Transport("port closed".into()));
        }
        self.sent.lock().unwrap().push(Sent {
            message,
            target: *target,
            target_origin: target_origin.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self, handler: MessageHandler) -> Box<dyn Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().unwrap().push((id, handler));
        Box::new(FakeSubscription {
            handlers: Arc::clone(&self.handlers),
            id,
            fail: Arc::clone(&self.fail_unsubscribe),
        })
    }
}

struct FakeSubscription {
    handlers: Handlers,
    id: u64,
    fail: Arc<AtomicBool>,
}

impl Subscription for FakeSubscription {
    fn unsubscribe(&mut self) -> Result<()> {
        self.handlers.lock().unwrap().retain(|(id, _)| *id != self.id);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActivityError::Transport("already torn down".into()));
        }
        Ok(())
    }
}

// --------------------
// Dialog context
// --------------------
pub struct FakeDialog {
    location: Mutex<String>,
    opener: Option<ContextRef>,
    available: AtomicU32,
    navigations: Mutex<Vec<String>>,
    terminations: AtomicUsize,
    pub fail_terminate: AtomicBool,
    pub fail_navigate: AtomicBool,
}

impl FakeDialog {
    pub fn new(opener: Option<ContextRef>) -> Arc<Self> {
        Arc::new(Self {
            location: Mutex::new(format!("{DIALOG_ORIGIN}/activity")),
            opener,
            available: AtomicU32::new(600),
            navigations: Mutex::new(Vec::new()),
            terminations: AtomicUsize::new(0),
            fail_terminate: AtomicBool::new(false),
            fail_navigate: AtomicBool::new(false),
        })
    }

    pub fn popup() -> Arc<Self> {
        Self::new(Some(OPENER))
    }

    pub fn set_location(&self, loc: &str) {
        *self.location.lock().unwrap() = loc.to_string();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    pub fn available(&self) -> u32 {
        self.available.load(Ordering::SeqCst)
    }
}

impl DialogContext for FakeDialog {
    fn location(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    fn origin(&self) -> String {
        DIALOG_ORIGIN.to_string()
    }

    fn opener(&self) -> Option<ContextRef> {
        self.opener
    }

    fn available_size(&self) -> u32 {
        self.available.load(Ordering::SeqCst)
    }

    fn navigate(&self, url: &str) -> Result<()> {
        if self.fail_navigate.load(Ordering::SeqCst) {
            return Err(ActivityError::Transport("navigation blocked".into()));
        }
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(ActivityError::Transport("intentional".into()));
        }
        Ok(())
    }
}

// --------------------
// Size container
// --------------------
#[derive(Default)]
pub struct FakeContainer {
    requested: AtomicU32,
}

impl FakeContainer {
    pub fn new(requested: u32) -> Arc<Self> {
        Arc::new(Self {
            requested: AtomicU32::new(requested),
        })
    }

    pub fn set_requested(&self, v: u32) {
        self.requested.store(v, Ordering::SeqCst);
    }
}

impl SizeContainer for FakeContainer {
    fn requested_size(&self) -> u32 {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Collects resize notifications.
pub fn resize_recorder() -> (
    Arc<Mutex<Vec<(u32, u32, bool)>>>,
    activity_host::resize::ResizeCallback,
) {
    let calls: Arc<Mutex<Vec<(u32, u32, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let cb: activity_host::resize::ResizeCallback = Arc::new(move |allowed: u32, requested: u32, overflow: bool| {
        sink.lock().unwrap().push((allowed, requested, overflow));
    });
    (calls, cb)
}
