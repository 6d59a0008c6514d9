//! Debounced resize notifications.
//!
//! Bursts of `resized()` calls collapse into one measurement taken after the
//! quiescence window. Each call aborts the pending notification and re-arms it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::env::{DialogContext, SizeContainer};

/// `(allowed, requested, overflow)` where `overflow == allowed < requested`.
pub type ResizeCallback = Arc<dyn Fn(u32, u32, bool) + Send + Sync>;

#[derive(Default)]
struct ResizeState {
    container: Option<Arc<dyn SizeContainer>>,
    callback: Option<ResizeCallback>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

pub struct Resizer {
    debounce: Duration,
    context: Arc<dyn DialogContext>,
    state: Mutex<ResizeState>,
}

impl Resizer {
    pub fn new(context: Arc<dyn DialogContext>, debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            debounce,
            context,
            state: Mutex::new(ResizeState::default()),
        })
    }

    pub fn set_size_container(&self, container: Arc<dyn SizeContainer>) {
        if let Ok(mut st) = self.state.lock() {
            if st.container.is_some() {
                tracing::debug!("replacing size container");
            }
            st.container = Some(container);
        }
    }

    pub fn on_resize_complete(&self, callback: ResizeCallback) {
        if let Ok(mut st) = self.state.lock() {
            st.callback = Some(callback);
        }
    }

    /// Schedule a measurement after the debounce window.
    pub fn resized(self: &Arc<Self>) {
        let Ok(mut st) = self.state.lock() else {
            return;
        };
        if st.container.is_none() {
            tracing::debug!("resized() before a size container was set");
            return;
        }
        if let Some(pending) = st.pending.take() {
            pending.abort();
        }
        let Ok(rt) = Handle::try_current() else {
            tracing::warn!("resized() outside a tokio runtime; notification skipped");
            return;
        };

        st.generation = st.generation.wrapping_add(1);
        let generation = st.generation;
        let this = Arc::clone(self);
        let delay = self.debounce;
        st.pending = Some(rt.spawn(async move {
            tokio::time::sleep(delay).await;
            this.complete(generation);
        }));
    }

    /// Drop any pending notification.
    pub fn cancel(&self) {
        if let Ok(mut st) = self.state.lock() {
            st.generation = st.generation.wrapping_add(1);
            if let Some(pending) = st.pending.take() {
                pending.abort();
            }
        }
    }

    fn complete(&self, generation: u64) {
        let (container, callback) = {
            let Ok(mut st) = self.state.lock() else {
                return;
            };
            // A newer burst re-armed the timer after this one woke up.
            if st.generation != generation {
                return;
            }
            st.pending = None;
            (st.container.clone(), st.callback.clone())
        };
        let Some(container) = container else {
            return;
        };

        let allowed = self.context.available_size();
        let requested = container.requested_size();
        let overflow = allowed < requested;
        tracing::debug!(allowed, requested, overflow, "resize complete");

        if let Some(cb) = callback {
            cb(allowed, requested, overflow);
        }
    }
}
