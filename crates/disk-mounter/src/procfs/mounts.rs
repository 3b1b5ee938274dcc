//! Parsing helpers for `/proc/mounts` (the `fstab`-style mount table).

/// Default location of the kernel mount table.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// One record of the mount table. Only the first two fields are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
}

impl MountEntry {
    /// True when `path` names either side of this entry.
    pub fn matches(&self, path: &str) -> bool {
        self.device == path || self.mount_point == path
    }
}

/// Iterate over the entries of a mount table in file order.
///
/// Blank lines are skipped, as are lines with fewer than two fields; the
/// kernel never writes those, but a truncated read must not abort a scan.
pub fn parse_mounts(content: &str) -> impl Iterator<Item = MountEntry> + '_ {
    content.lines().filter_map(|line| {
        let mut fields = line.split_whitespace();
        let device = fields.next()?;
        let Some(mount_point) = fields.next() else {
            log::debug!("skipping short mount table line: {:?}", line);
            return None;
        };
        Some(MountEntry {
            device: unescape_mount_path(device),
            mount_point: unescape_mount_path(mount_point),
        })
    })
}

/// Decode the octal escapes the kernel uses for whitespace in mount fields.
pub fn unescape_mount_path(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}
