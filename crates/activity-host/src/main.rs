//! Activity host demo (redirect strategy)
//!
//! Usage: `activity-host <dialog-location> [result-json]`
//! - Reads the request from the `__WA__` fragment of the location
//! - Accepts, answers with the given result data, prints the return navigation
//! - Config from `activity-host.yaml` when present, defaults otherwise

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use activity_core::error::Result;
use activity_core::protocol::envelope::origin_of;
use activity_host::config::{self, HostConfig};
use activity_host::env::{ContextRef, DialogContext};
use activity_host::{ActivityHost, ConnectHost, RedirectHost};

const CONFIG_PATH: &str = "activity-host.yaml";

/// Dialog context whose navigations are printed instead of followed.
struct StdoutDialog {
    location: String,
}

impl DialogContext for StdoutDialog {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn origin(&self) -> String {
        origin_of(&self.location).unwrap_or_else(|_| "null".into())
    }

    fn opener(&self) -> Option<ContextRef> {
        None
    }

    fn available_size(&self) -> u32 {
        0
    }

    fn navigate(&self, url: &str) -> Result<()> {
        println!("{url}");
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH).expect("config load failed")
    } else {
        HostConfig::default()
    };

    let mut argv = std::env::args().skip(1);
    let location = argv
        .next()
        .expect("usage: activity-host <dialog-location> [result-json]");
    let data = argv
        .next()
        .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
        .unwrap_or(Value::Null);

    let dialog = Arc::new(StdoutDialog { location });
    let host = RedirectHost::new(dialog, &cfg)
        .connect(None)
        .await
        .expect("connect failed");

    tracing::info!(
        origin = %host.target_origin().unwrap_or_default(),
        mode = host.mode().as_str(),
        "activity-host connected"
    );

    host.accept().expect("accept failed");
    host.result(data).expect("result failed");
    host.disconnect();
}
