//! Disk mount coordination for the host agent.
//!
//! [`Mounter`] mounts, unmounts and remounts block devices and enables swap
//! on them by shelling out to `mount`, `umount` and `swapon`. The kernel mount
//! table is consulted on every call to keep those operations idempotent and
//! to refuse mounting one device twice or two devices on one mount point.
//!
//! World-touching work goes through the [`hal`] traits so the mounter runs
//! against [`LinuxHal`] in production and [`FakeHal`] in tests.

pub mod config;
pub mod error;
pub mod hal;
pub mod mounter;
pub mod procfs;

pub use config::{MounterConfig, UnmountRetry};
pub use error::{MountError, MountResult, ResultExt};
pub use hal::{FakeHal, FileOps, LinuxHal, MountOps, MounterHal, Operation, ProcessOps, SystemOps};
pub use mounter::Mounter;
