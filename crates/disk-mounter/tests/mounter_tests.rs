use disk_mounter::{FakeHal, MountError, MountOps, Mounter, MounterConfig, UnmountRetry};
use std::io;
use std::sync::Arc;
use std::time::Duration;

const TABLE: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda1 /mnt/a ext4 rw,relatime 0 0
";

const SWAPS: &str = "\
Filename                                Type            Size    Used    Priority
/dev/sda2                               partition       1048572 0       -2
";

fn mounter_with(hal: &FakeHal, max_attempts: u32) -> Mounter {
    Mounter::with_retry(
        Arc::new(hal.clone()),
        UnmountRetry {
            max_attempts,
            interval: Duration::from_millis(250),
        },
    )
}

#[test]
fn unmount_of_unmounted_target_is_a_noop() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    let unmounted = mounter.unmount("/mnt/b").unwrap();

    assert!(!unmounted);
    assert!(hal.command_lines().is_empty());
}

#[test]
fn unmount_accepts_device_or_mount_point() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    assert!(mounter.unmount("/dev/sda1").unwrap());
    assert_eq!(hal.command_lines(), vec!["umount /dev/sda1"]);
    assert!(!mounter.unmount("/mnt/a").unwrap());
}

#[test]
fn mount_of_already_mounted_pair_is_a_noop() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    mounter.mount("/dev/sda1", "/mnt/a", &["-t", "ext4"]).unwrap();

    assert!(hal.command_lines().is_empty());
}

#[test]
fn mount_runs_mount_with_options_in_order() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    mounter
        .mount("/dev/sdb1", "/mnt/b", &["-t", "ext4", "-o", "noatime"])
        .unwrap();

    assert_eq!(
        hal.command_lines(),
        vec!["mount /dev/sdb1 /mnt/b -t ext4 -o noatime"]
    );
    assert!(mounter.is_mount_point("/mnt/b").unwrap());
}

#[test]
fn mounting_a_mounted_device_elsewhere_is_refused() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    let err = mounter.mount("/dev/sda1", "/mnt/b", &[]).unwrap_err();

    assert!(matches!(err, MountError::DeviceMountedElsewhere { .. }));
    let message = err.to_string();
    assert!(message.contains("/mnt/a"));
    assert!(message.contains("/mnt/b"));
    assert!(hal.command_lines().is_empty());
}

#[test]
fn mounting_onto_an_occupied_mount_point_is_refused() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    let err = mounter.mount("/dev/sdb1", "/mnt/a", &[]).unwrap_err();

    assert!(matches!(err, MountError::MountPointInUse { .. }));
    let message = err.to_string();
    assert!(message.contains("/dev/sda1"));
    assert!(message.contains("/dev/sdb1"));
    assert!(hal.command_lines().is_empty());
}

#[test]
fn unmount_retries_until_budget_is_exhausted() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    hal.fail_command("umount", "umount: /mnt/a: target is busy.");
    let mounter = mounter_with(&hal, 5);

    let err = mounter.unmount("/mnt/a").unwrap_err();

    assert_eq!(hal.command_count("umount"), 5);
    assert_eq!(hal.sleeps(), vec![Duration::from_millis(250); 4]);
    match err {
        MountError::CommandFailed { program, stderr, .. } => {
            assert_eq!(program, "umount");
            assert_eq!(stderr, "umount: /mnt/a: target is busy.");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(mounter.is_mounted("/mnt/a").unwrap());
}

#[test]
fn unmount_uses_configured_default_budget() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    hal.fail_command("umount", "target is busy");
    let mounter = Mounter::new(Arc::new(hal.clone()), &MounterConfig::default());

    assert!(mounter.unmount("/mnt/a").is_err());

    assert_eq!(hal.command_count("umount"), 600);
    assert_eq!(hal.sleeps().len(), 599);
    assert!(hal
        .sleeps()
        .iter()
        .all(|d| *d == Duration::from_millis(500)));
}

#[test]
fn sleeps_only_between_attempts() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    hal.fail_command_times("umount", 1, "target is busy");
    let mounter = mounter_with(&hal, 600);

    assert!(mounter.unmount("/mnt/a").unwrap());

    let ops: Vec<String> = hal
        .operations()
        .into_iter()
        .filter_map(|op| match op {
            disk_mounter::Operation::Command { program, .. } => Some(program),
            disk_mounter::Operation::Sleep { .. } => Some("sleep".to_string()),
            disk_mounter::Operation::ReadFile { .. } => None,
        })
        .collect();
    assert_eq!(ops, vec!["umount", "sleep", "umount"]);
}

#[test]
fn swap_on_skips_already_active_device() {
    let hal = FakeHal::new().with_swap_summary(SWAPS);
    let mounter = mounter_with(&hal, 600);

    mounter.swap_on("/dev/sda2").unwrap();

    assert_eq!(hal.command_lines(), vec!["swapon -s"]);
}

#[test]
fn swap_on_enables_inactive_device() {
    let hal = FakeHal::new().with_swap_summary(SWAPS);
    let mounter = mounter_with(&hal, 600);

    mounter.swap_on("/dev/sdb2").unwrap();
    mounter.swap_on("/dev/sdb2").unwrap();

    assert_eq!(
        hal.command_lines(),
        vec!["swapon -s", "swapon /dev/sdb2", "swapon -s"]
    );
}

#[test]
fn swap_on_never_matches_the_header_line() {
    let hal = FakeHal::new().with_swap_summary("/dev/sda2 partition 1048572 0 -2\n");
    let mounter = mounter_with(&hal, 600);

    mounter.swap_on("/dev/sda2").unwrap();

    assert_eq!(hal.command_lines(), vec!["swapon -s", "swapon /dev/sda2"]);
}

#[test]
fn remount_unmounts_then_mounts_the_same_device() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    mounter.remount("/mnt/a", "/mnt/a", &["-o", "ro"]).unwrap();

    assert_eq!(
        hal.command_lines(),
        vec!["umount /mnt/a", "mount /dev/sda1 /mnt/a -o ro"]
    );
}

#[test]
fn remount_as_readonly_forces_ro() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    mounter.remount_as_readonly("/mnt/a").unwrap();

    assert_eq!(
        hal.command_lines(),
        vec!["umount /mnt/a", "mount /dev/sda1 /mnt/a -o ro"]
    );
}

#[test]
fn remount_moves_device_to_new_mount_point() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    mounter.remount("/mnt/a", "/mnt/new", &[]).unwrap();

    assert_eq!(
        hal.command_lines(),
        vec!["umount /mnt/a", "mount /dev/sda1 /mnt/new"]
    );
    assert!(!mounter.is_mount_point("/mnt/a").unwrap());
    assert!(mounter.is_mount_point("/mnt/new").unwrap());
}

#[test]
fn remount_of_unknown_mount_point_runs_nothing() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    // A device path is not a mount point.
    let err = mounter.remount("/dev/sda1", "/mnt/b", &[]).unwrap_err();

    assert!(matches!(err, MountError::DeviceNotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Error finding device for mount point /dev/sda1"
    );
    assert!(hal.command_lines().is_empty());
}

#[test]
fn remount_does_not_mount_after_failed_unmount() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    hal.fail_command("umount", "target is busy");
    let mounter = mounter_with(&hal, 2);

    let err = mounter.remount("/mnt/a", "/mnt/a", &["-o", "ro"]).unwrap_err();

    assert!(err.to_string().starts_with("Unmounting /mnt/a: "));
    assert_eq!(hal.command_count("umount"), 2);
    assert_eq!(hal.command_count("mount"), 0);
}

#[test]
fn is_mounted_and_is_mount_point_differ_on_devices() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);

    assert!(mounter.is_mounted("/dev/sda1").unwrap());
    assert!(mounter.is_mounted("/mnt/a").unwrap());
    assert!(!mounter.is_mounted("/mnt").unwrap());

    assert!(mounter.is_mount_point("/mnt/a").unwrap());
    assert!(!mounter.is_mount_point("/dev/sda1").unwrap());
}

#[test]
fn decisions_follow_external_table_changes() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    let mounter = mounter_with(&hal, 600);
    assert!(mounter.is_mount_point("/mnt/a").unwrap());

    hal.set_mount_table("");

    assert!(!mounter.is_mount_point("/mnt/a").unwrap());
    mounter.mount("/dev/sdb1", "/mnt/a", &[]).unwrap();
    assert_eq!(hal.command_lines(), vec!["mount /dev/sdb1 /mnt/a"]);
}

#[test]
fn remount_fails_fast_when_mount_table_is_unreadable() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    hal.fail_mount_table_read(io::ErrorKind::PermissionDenied);
    let mounter = mounter_with(&hal, 600);

    let err = mounter.remount("/mnt/a", "/mnt/a", &["-o", "ro"]).unwrap_err();

    assert!(matches!(err, MountError::Context { .. }));
    assert!(err
        .to_string()
        .starts_with("Error finding device for mount point /mnt/a: Reading mount table /proc/mounts"));
    assert!(matches!(err.root_cause(), MountError::ReadMountTable { .. }));
    assert!(hal.command_lines().is_empty());
}

#[test]
fn mount_fails_when_mount_table_is_unreadable() {
    let hal = FakeHal::new();
    hal.fail_mount_table_read(io::ErrorKind::PermissionDenied);
    let mounter = mounter_with(&hal, 600);

    let err = mounter.mount("/dev/sdb1", "/mnt/b", &[]).unwrap_err();

    assert!(matches!(err, MountError::ReadMountTable { .. }));
    assert!(hal.command_lines().is_empty());
}

#[test]
fn unmount_fails_when_mount_table_is_unreadable() {
    let hal = FakeHal::new().with_mount_table(TABLE);
    hal.fail_mount_table_read(io::ErrorKind::PermissionDenied);
    let mounter = mounter_with(&hal, 600);

    let err = mounter.unmount("/mnt/a").unwrap_err();

    assert!(matches!(err, MountError::ReadMountTable { .. }));
    assert!(hal.command_lines().is_empty());
    assert!(hal.sleeps().is_empty());
}
