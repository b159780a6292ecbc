//! Module settings.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Settings loading/validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("can not read settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file does not parse.
    #[error("can not parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting value is out of range.
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

/// Board module settings, loaded from one TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the RPC endpoint listens on.
    pub listen_addr: String,

    /// Path of the board snapshot file.
    pub store_path: PathBuf,

    /// Endpoint of the access-control module.
    pub access_endpoint: String,

    /// Endpoint of the notification module.
    pub notification_endpoint: String,

    /// Byte length of the generated DKey.
    #[serde(default = "default_dkey_size")]
    pub dkey_size: usize,

    /// Place new threads (and threads with new messages) at the top of
    /// their forum.
    #[serde(default)]
    pub new_threads_at_top: bool,

    /// Seconds after the last touch during which a writer may still edit
    /// their own message.
    #[serde(default = "default_edit_window")]
    pub message_edit_window_secs: u64,

    /// Items per page in paginated listings.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Cooldown between store reconnection attempts.
    #[serde(default = "default_store_retry_cooldown")]
    pub store_retry_cooldown_secs: u64,
}

fn default_dkey_size() -> usize {
    64
}

fn default_edit_window() -> u64 {
    3600
}

fn default_page_size() -> usize {
    20
}

fn default_store_retry_cooldown() -> u64 {
    5
}

impl Settings {
    /// Loads and validates settings from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&text)?;
        settings.check()?;
        Ok(settings)
    }

    /// Validates setting values.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.listen_addr.is_empty() {
            return Err(ConfigError::Invalid("listen_addr is empty"));
        }
        if self.dkey_size == 0 {
            return Err(ConfigError::Invalid("dkey_size is zero"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size is zero"));
        }
        if self.store_retry_cooldown_secs == 0 {
            return Err(ConfigError::Invalid("store_retry_cooldown_secs is zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_settings_parse_with_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            listen_addr = "127.0.0.1:3050"
            store_path = "/var/lib/agora/board.json"
            access_endpoint = "https://acm.local/rpc"
            notification_endpoint = "https://nm.local/rpc"
            "#,
        )
        .unwrap();
        settings.check().unwrap();
        assert_eq!(settings.dkey_size, 64);
        assert_eq!(settings.page_size, 20);
        assert!(!settings.new_threads_at_top);
    }

    #[test]
    fn zero_dkey_size_is_rejected() {
        let settings: Settings = toml::from_str(
            r#"
            listen_addr = "127.0.0.1:3050"
            store_path = "board.json"
            access_endpoint = "x"
            notification_endpoint = "y"
            dkey_size = 0
            "#,
        )
        .unwrap();
        assert!(settings.check().is_err());
    }
}
