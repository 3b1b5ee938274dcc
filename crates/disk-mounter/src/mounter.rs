//! Mount table aware mount coordination.
//!
//! The kernel mount table is re-read on every call and is the only state the
//! decisions below consult. Nothing is cached between calls, so external
//! changes to the table are always observed. The check-then-act sequence is
//! not atomic: two concurrent mounts may both pass the conflict check.

use crate::config::{MounterConfig, UnmountRetry, DEFAULT_COMMAND_TIMEOUT};
use crate::error::ResultExt;
use crate::hal::{MountOps, MounterHal};
use crate::procfs::{parse_mounts, swap_listed, MountEntry, PROC_MOUNTS};
use crate::{MountError, MountResult};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

/// Mounts, unmounts, remounts and enables swap through the host's
/// `mount`/`umount`/`swapon` utilities.
pub struct Mounter {
    hal: Arc<dyn MounterHal>,
    mount_table: PathBuf,
    retry: UnmountRetry,
    command_timeout: Duration,
}

impl Mounter {
    pub fn new(hal: Arc<dyn MounterHal>, config: &MounterConfig) -> Self {
        Self {
            hal,
            mount_table: config.mount_table.clone(),
            retry: config.unmount_retry(),
            command_timeout: config.command_timeout(),
        }
    }

    /// Build a mounter reading `/proc/mounts` with an explicit retry policy.
    pub fn with_retry(hal: Arc<dyn MounterHal>, retry: UnmountRetry) -> Self {
        Self {
            hal,
            mount_table: PathBuf::from(PROC_MOUNTS),
            retry,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn retry(&self) -> UnmountRetry {
        self.retry
    }

    pub fn mount_table_path(&self) -> &Path {
        &self.mount_table
    }

    /// Device mounted at exactly `mount_point`, if any.
    pub fn find_device_for_mount_point(&self, mount_point: &str) -> MountResult<Option<String>> {
        self.search_mounts(|entry| {
            Ok((entry.mount_point == mount_point).then(|| entry.device.clone()))
        })
    }

    /// Scan the mount table, stopping at the first entry for which `visit`
    /// returns `Some` or an error.
    fn search_mounts<T, F>(&self, mut visit: F) -> MountResult<Option<T>>
    where
        F: FnMut(&MountEntry) -> MountResult<Option<T>>,
    {
        let table = self
            .hal
            .read_file_string(&self.mount_table)
            .map_err(|source| MountError::ReadMountTable {
                path: self.mount_table.clone(),
                source,
            })?;

        for entry in parse_mounts(&table) {
            if let Some(found) = visit(&entry)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Decide whether `partition_path` still has to be mounted at `mount_point`.
    ///
    /// `Ok(false)` means it already is. Any other association of either side
    /// is a conflict.
    fn should_mount(&self, partition_path: &str, mount_point: &str) -> MountResult<bool> {
        let already_mounted = self.search_mounts(|entry| {
            let same_device = entry.device == partition_path;
            let same_mount_point = entry.mount_point == mount_point;
            match (same_device, same_mount_point) {
                (true, true) => Ok(Some(())),
                (true, false) => Err(MountError::DeviceMountedElsewhere {
                    device: entry.device.clone(),
                    mounted_at: entry.mount_point.clone(),
                    requested: mount_point.to_string(),
                }),
                (false, true) => Err(MountError::MountPointInUse {
                    device: entry.device.clone(),
                    mount_point: entry.mount_point.clone(),
                    requested: partition_path.to_string(),
                }),
                (false, false) => Ok(None),
            }
        })?;
        Ok(already_mounted.is_none())
    }

    fn run(&self, program: &str, args: &[&str]) -> MountResult<Output> {
        log::info!("{} {}", program, args.join(" "));
        self.hal.command_status(program, args, self.command_timeout)
    }

    fn active_swap_summary(&self) -> String {
        match self
            .hal
            .command_output("swapon", &["-s"], self.command_timeout)
        {
            Ok(output) => {
                if !output.status.success() {
                    log::warn!(
                        "swapon -s exited with {:?}: {}",
                        output.status.code(),
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                }
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
            Err(err) => {
                log::warn!("listing active swap failed, assuming none: {}", err);
                String::new()
            }
        }
    }
}

impl MountOps for Mounter {
    fn mount(&self, partition_path: &str, mount_point: &str, options: &[&str]) -> MountResult<()> {
        if !self.should_mount(partition_path, mount_point)? {
            log::info!("{} is already mounted at {}", partition_path, mount_point);
            return Ok(());
        }

        let mut args = vec![partition_path, mount_point];
        args.extend_from_slice(options);
        self.run("mount", &args).context("Shelling out to mount")?;
        Ok(())
    }

    fn unmount(&self, partition_or_mount_point: &str) -> MountResult<bool> {
        if !self.is_mounted(partition_or_mount_point)? {
            log::debug!("{} is not mounted, nothing to unmount", partition_or_mount_point);
            return Ok(false);
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.run("umount", &[partition_or_mount_point]) {
                Ok(_) => return Ok(true),
                Err(err) if attempt >= max_attempts => {
                    log::warn!(
                        "giving up unmounting {} after {} attempts",
                        partition_or_mount_point,
                        attempt
                    );
                    return Err(err);
                }
                Err(err) => {
                    log::warn!(
                        "unmounting {} failed (attempt {}/{}): {}",
                        partition_or_mount_point,
                        attempt,
                        max_attempts,
                        err
                    );
                    self.hal.sleep(self.retry.interval);
                    attempt += 1;
                }
            }
        }
    }

    fn remount(
        &self,
        from_mount_point: &str,
        to_mount_point: &str,
        options: &[&str],
    ) -> MountResult<()> {
        let partition_path = match self.find_device_for_mount_point(from_mount_point) {
            Ok(Some(device)) => device,
            Ok(None) => {
                return Err(MountError::DeviceNotFound {
                    mount_point: from_mount_point.to_string(),
                })
            }
            Err(err) => {
                return Err(err.context(format!(
                    "Error finding device for mount point {from_mount_point}"
                )))
            }
        };

        self.unmount(from_mount_point)
            .with_context(|| format!("Unmounting {from_mount_point}"))?;

        self.mount(&partition_path, to_mount_point, options)
    }

    fn swap_on(&self, partition_path: &str) -> MountResult<()> {
        if swap_listed(&self.active_swap_summary(), partition_path) {
            log::info!("swap already enabled on {}", partition_path);
            return Ok(());
        }

        self.run("swapon", &[partition_path])
            .context("Shelling out to swapon")?;
        Ok(())
    }

    fn is_mounted(&self, partition_or_mount_point: &str) -> MountResult<bool> {
        let found = self.search_mounts(|entry| {
            Ok(entry.matches(partition_or_mount_point).then_some(()))
        })?;
        Ok(found.is_some())
    }

    fn is_mount_point(&self, path: &str) -> MountResult<bool> {
        let found = self.search_mounts(|entry| Ok((entry.mount_point == path).then_some(())))?;
        Ok(found.is_some())
    }
}
