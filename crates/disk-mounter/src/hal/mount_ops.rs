//! Mount operations trait.

use crate::MountResult;

/// Trait for mounting, unmounting and enabling swap on block devices.
///
/// Paths are compared as exact strings against the kernel mount table, so
/// `/mnt/a` and `/mnt/a/` are different mount points here.
pub trait MountOps {
    /// Mount a partition at a mount point.
    ///
    /// # Arguments
    /// * `partition_path` - Device path (e.g., `/dev/sda1`)
    /// * `mount_point` - Mount point path
    /// * `options` - Extra arguments appended to the `mount` command line
    ///   (e.g., `["-t", "ext4"]` or `["-o", "ro"]`)
    ///
    /// Succeeds without running anything if the partition is already mounted
    /// at `mount_point`. Fails without running anything if the partition is
    /// mounted elsewhere or another device occupies `mount_point`.
    fn mount(&self, partition_path: &str, mount_point: &str, options: &[&str]) -> MountResult<()>;

    /// Unmount a partition or mount point.
    ///
    /// Returns `Ok(false)` if nothing by that name is mounted, `Ok(true)` once
    /// an unmount succeeded. Busy targets are retried.
    fn unmount(&self, partition_or_mount_point: &str) -> MountResult<bool>;

    /// Move whatever is mounted at `from_mount_point` to `to_mount_point`.
    fn remount(
        &self,
        from_mount_point: &str,
        to_mount_point: &str,
        options: &[&str],
    ) -> MountResult<()>;

    /// Remount `mount_point` in place with `-o ro`.
    fn remount_as_readonly(&self, mount_point: &str) -> MountResult<()> {
        self.remount(mount_point, mount_point, &["-o", "ro"])
    }

    /// Enable swap on a partition unless it is already active.
    fn swap_on(&self, partition_path: &str) -> MountResult<()>;

    /// True if a partition or mount point with this name is mounted.
    fn is_mounted(&self, partition_or_mount_point: &str) -> MountResult<bool>;

    /// True if `path` is exactly the mount point of some mounted device.
    fn is_mount_point(&self, path: &str) -> MountResult<bool>;
}
