//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files, including the
//! selector chains that shield the pipeline from host markup churn.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, ExportError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# nlm-exporter configuration
# Auto-generated - edit as needed

[timing]
# Poll interval while waiting on content, in milliseconds
poll_interval_ms = 100

# Maximum wait for Studio content to load, in milliseconds
content_wait_ms = 10000

# Settle delay after back navigation, in milliseconds
settle_ms = 500

# How long outcome feedback stays on a control, in milliseconds
feedback_ms = 2000

# Reconciliation sweep period, in milliseconds
reconcile_period_ms = 1000

[export]
# Label used in front-matter and document headings
source_label = "NotebookLM"

# Prefix for generated filenames
file_prefix = "notebooklm"

# Output directory (optional, defaults to the downloads directory)
# output_dir = "/custom/path"

# [selectors] accepts per-surface locator chains; unset chains keep
# their built-in fallbacks. Each entry is a list of strategies, e.g.
# main_container = [{ kind = "role", value = "main" }, { kind = "tag", name = "main" }]
"#;

/// Load configuration from file or create default.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = AppConfig::config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| ExportError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| ExportError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_path = AppConfig::config_file_path();

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ExportError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| ExportError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(&config_path, content).map_err(|e| {
        ExportError::io(
            format!("Failed to write config file: {}", config_path.display()),
            e,
        )
    })?;

    tracing::info!(path = %config_path.display(), "Configuration saved");

    Ok(())
}

/// Create default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists() -> Result<()> {
    let config_path = AppConfig::config_file_path();

    if !config_path.exists() {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ExportError::io("Failed to create config directory", e))?;
        }

        fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| ExportError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(())
}
