//! Parsers for the text tables the kernel and util-linux expose.

pub mod mounts;
pub mod swaps;

pub use mounts::{parse_mounts, unescape_mount_path, MountEntry, PROC_MOUNTS};
pub use swaps::swap_listed;
