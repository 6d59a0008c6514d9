use std::time::Duration;

use serde::Deserialize;
use activity_core::error::{ActivityError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub version: u32,

    #[serde(default)]
    pub host: HostSection,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: 1,
            host: HostSection::default(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ActivityError::UnsupportedVersion);
        }

        self.host.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    /// How long the popup waits for the opener's `start` before redirecting.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Quiescence window before a resize burst is reported.
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            resize_debounce_ms: default_resize_debounce_ms(),
        }
    }
}

impl HostSection {
    pub fn validate(&self) -> Result<()> {
        if !(500..=60000).contains(&self.connect_timeout_ms) {
            return Err(ActivityError::Config(
                "host.connect_timeout_ms must be between 500 and 60000".into(),
            ));
        }
        if !(1..=5000).contains(&self.resize_debounce_ms) {
            return Err(ActivityError::Config(
                "host.resize_debounce_ms must be between 1 and 5000".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_resize_debounce_ms() -> u64 {
    50
}
