//! HAL trait definitions and implementations.
//!
//! This module defines the traits for the world-touching operations the
//! mounter needs and provides both real (LinuxHal) and fake (FakeHal)
//! implementations.

pub mod fake_hal;
pub mod file_ops;
pub mod linux_hal;
pub mod mount_ops;
pub mod process_ops;
pub mod system_ops;

pub use fake_hal::{FakeHal, Operation};
pub use file_ops::FileOps;
pub use linux_hal::LinuxHal;
pub use mount_ops::MountOps;
pub use process_ops::ProcessOps;
pub use system_ops::SystemOps;

/// Everything the mounter needs from the host: command execution, mount
/// table reads, and sleeping between retries.
pub trait MounterHal: ProcessOps + FileOps + SystemOps + Send + Sync {}

/// Automatically implement MounterHal for any type implementing all required traits.
impl<T> MounterHal for T where T: ProcessOps + FileOps + SystemOps + Send + Sync {}
