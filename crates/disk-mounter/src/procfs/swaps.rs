//! Parsing helpers for `swapon -s` output (same layout as `/proc/swaps`).

/// Returns true if `partition_path` is listed as an active swap device.
///
/// The first line is always a header and is skipped without inspection.
pub fn swap_listed(summary: &str, partition_path: &str) -> bool {
    summary
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .any(|device| device == partition_path)
}
