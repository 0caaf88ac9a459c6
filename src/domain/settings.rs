//! Application configuration models.
//!
//! Timing knobs for the bounded waits, export cosmetics, and the selector
//! chains, all loadable from a TOML file with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::locator::SelectorConfig;

/// Bounds for every wait in the system. All waits are cooperative and
/// bounded; there are no unbounded sleeps anywhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Interval between content-readiness polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum total wait for the content viewer to load, in milliseconds.
    #[serde(default = "default_content_wait_ms")]
    pub content_wait_ms: u64,

    /// Settle delay after a simulated navigation click, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// How long transient feedback stays on a trigger control before the
    /// idle label returns, in milliseconds.
    #[serde(default = "default_feedback_ms")]
    pub feedback_ms: u64,

    /// Period of the reconciliation safety-net timer, in milliseconds.
    #[serde(default = "default_reconcile_period_ms")]
    pub reconcile_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            content_wait_ms: default_content_wait_ms(),
            settle_ms: default_settle_ms(),
            feedback_ms: default_feedback_ms(),
            reconcile_period_ms: default_reconcile_period_ms(),
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn content_wait(&self) -> Duration {
        Duration::from_millis(self.content_wait_ms)
    }

    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[must_use]
    pub const fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    #[must_use]
    pub const fn reconcile_period(&self) -> Duration {
        Duration::from_millis(self.reconcile_period_ms)
    }
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_content_wait_ms() -> u64 {
    10_000
}

const fn default_settle_ms() -> u64 {
    500
}

const fn default_feedback_ms() -> u64 {
    2000
}

const fn default_reconcile_period_ms() -> u64 {
    1000
}

/// Export cosmetics: labels, filename prefix, output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// `source:` label written into front-matter.
    #[serde(default = "default_source_label")]
    pub source_label: String,

    /// Filename prefix for both export kinds.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Output directory (defaults to the platform downloads directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            source_label: default_source_label(),
            file_prefix: default_file_prefix(),
            output_dir: None,
        }
    }
}

fn default_source_label() -> String {
    "NotebookLM".to_string()
}

fn default_file_prefix() -> String {
    "notebooklm".to_string()
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Wait bounds and loop periods.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Export cosmetics.
    #[serde(default)]
    pub export: ExportConfig,

    /// Locator chain overrides.
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl AppConfig {
    /// Resolved output directory for exported files.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export.output_dir.clone().unwrap_or_else(|| {
            dirs::download_dir().unwrap_or_else(std::env::temp_dir)
        })
    }

    /// Default configuration directory.
    #[must_use]
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("nlm-exporter")
    }

    /// Path to the configuration file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }
}
