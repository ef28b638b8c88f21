//! RON configuration for an export run.
//!
//! Every field is optional in the file; command-line flags are applied on
//! top by [`crate::cli`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wxr_engine::{FetchFailurePolicy, FetchSettings, PackageOptions, RetryPolicy};
use wxr_logging::wxr_info;

pub const DEFAULT_OUTPUT: &str = "output.zip";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Hostnames whose images are the site's own media.
    pub local_hosts: Vec<String>,
    pub output: PathBuf,
    /// Media cache directory; `None` uses `~/.klaxon/cache/media`.
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub skip_failed_media: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            local_hosts: Vec::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            cache_dir: None,
            request_timeout_secs: fetch.request_timeout.as_secs(),
            retry_attempts: RetryPolicy::default().attempts,
            skip_failed_media: false,
        }
    }
}

impl ExportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = ron::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        wxr_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..FetchSettings::default()
        }
    }

    pub fn package_options(&self) -> PackageOptions {
        PackageOptions {
            retry: RetryPolicy {
                attempts: self.retry_attempts,
                ..RetryPolicy::default()
            },
            on_fetch_failure: if self.skip_failed_media {
                FetchFailurePolicy::SkipAndReport
            } else {
                FetchFailurePolicy::Abort
            },
        }
    }
}
