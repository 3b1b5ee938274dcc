use std::path::PathBuf;
use thiserror::Error;

pub type MountResult<T> = std::result::Result<T, MountError>;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("Reading mount table {}: {source}", .path.display())]
    ReadMountTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Device {device} is already mounted to {mounted_at}, can't mount to {requested}")]
    DeviceMountedElsewhere {
        device: String,
        mounted_at: String,
        requested: String,
    },

    #[error("Device {device} is already mounted to {mount_point}, can't mount {requested}")]
    MountPointInUse {
        device: String,
        mount_point: String,
        requested: String,
    },

    #[error("Error finding device for mount point {mount_point}")]
    DeviceNotFound { mount_point: String },

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<MountError>,
    },
}

impl MountError {
    /// Wrap this error with a short description of the operation that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        MountError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers.
    pub fn root_cause(&self) -> &MountError {
        match self {
            MountError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// `anyhow`-style context attachment for [`MountResult`].
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> MountResult<T>;

    fn with_context<C, F>(self, f: F) -> MountResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for MountResult<T> {
    fn context(self, context: impl Into<String>) -> MountResult<T> {
        self.map_err(|err| err.context(context))
    }

    fn with_context<C, F>(self, f: F) -> MountResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|err| err.context(f()))
    }
}
