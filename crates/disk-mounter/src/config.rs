//! Mounter configuration, loadable from TOML.

use crate::procfs::PROC_MOUNTS;
use crate::{MountError, MountResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_UNMOUNT_RETRIES: u32 = 600;
pub const DEFAULT_UNMOUNT_RETRY_SLEEP: Duration = Duration::from_millis(500);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// How often and how patiently a busy unmount is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmountRetry {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub interval: Duration,
}

impl Default for UnmountRetry {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_UNMOUNT_RETRIES,
            interval: DEFAULT_UNMOUNT_RETRY_SLEEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MounterConfig {
    pub mount_table: PathBuf,
    pub max_unmount_retries: u32,
    pub unmount_retry_sleep_ms: u64,
    pub command_timeout_secs: u64,
}

impl Default for MounterConfig {
    fn default() -> Self {
        Self {
            mount_table: PathBuf::from(PROC_MOUNTS),
            max_unmount_retries: DEFAULT_MAX_UNMOUNT_RETRIES,
            unmount_retry_sleep_ms: DEFAULT_UNMOUNT_RETRY_SLEEP.as_millis() as u64,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
        }
    }
}

impl MounterConfig {
    pub fn from_toml_str(text: &str) -> MountResult<Self> {
        let config: MounterConfig =
            toml::from_str(text).map_err(|e| MountError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> MountResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| MountError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> MountResult<()> {
        if self.max_unmount_retries == 0 {
            return Err(MountError::Config(
                "max_unmount_retries must be at least 1".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(MountError::Config(
                "command_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.mount_table.as_os_str().is_empty() {
            return Err(MountError::Config("mount_table must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn unmount_retry(&self) -> UnmountRetry {
        UnmountRetry {
            max_attempts: self.max_unmount_retries,
            interval: Duration::from_millis(self.unmount_retry_sleep_ms),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
