//! Integration tests for hook install/uninstall semantics.

use std::sync::Arc;

use flightdeck_workspace::{FsHandle, TrackerConfig, WorkspaceTracker};
use tempfile::TempDir;

fn tracker(dir: &TempDir) -> Arc<WorkspaceTracker> {
    Arc::new(WorkspaceTracker::new(TrackerConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..TrackerConfig::default()
    }))
}

#[test]
fn test_install_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker(&dir);
    let fs = FsHandle::real();

    assert!(!fs.hooks_installed());
    fs.install_hooks(Arc::clone(&tracker));
    fs.install_hooks(Arc::clone(&tracker));
    assert!(fs.hooks_installed());

    let target = dir.path().join("a.txt");
    fs.write(&target, b"one").unwrap();
    // One write through doubly-installed hooks records exactly one op.
    assert_eq!(tracker.operations().len(), 1);
}

#[test]
fn test_uninstall_restores_pass_through() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker(&dir);
    let fs = FsHandle::real();

    fs.install_hooks(Arc::clone(&tracker));
    fs.uninstall_hooks();
    fs.uninstall_hooks();
    assert!(!fs.hooks_installed());

    let target = dir.path().join("a.txt");
    fs.write(&target, b"untracked").unwrap();
    fs.read_to_string(&target).unwrap();
    assert!(tracker.operations().is_empty());
}

#[test]
fn test_uninstall_when_never_installed_is_safe() {
    let fs = FsHandle::real();
    fs.uninstall_hooks();
    assert!(!fs.hooks_installed());
}

#[test]
fn test_tracked_and_untracked_writes_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker(&dir);

    let plain = FsHandle::real();
    let hooked = FsHandle::real();
    hooked.install_hooks(Arc::clone(&tracker));

    let plain_target = dir.path().join("plain.txt");
    let hooked_target = dir.path().join("hooked.txt");
    let payload = b"line1\nline2\n";
    plain.write(&plain_target, payload).unwrap();
    hooked.write(&hooked_target, payload).unwrap();

    assert_eq!(
        std::fs::read(&plain_target).unwrap(),
        std::fs::read(&hooked_target).unwrap()
    );
}

#[test]
fn test_hooked_reads_and_writes_are_recorded() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker(&dir);
    let fs = FsHandle::real();
    fs.install_hooks(Arc::clone(&tracker));

    let target = dir.path().join("a.txt");
    fs.write(&target, b"first").unwrap();
    fs.read_to_string(&target).unwrap();
    fs.write(&target, b"second").unwrap();

    let stats = tracker.stats();
    assert_eq!(stats.writes, 2);
    assert_eq!(stats.reads, 1);
    // Second write changed existing content, so exactly one diff exists.
    assert_eq!(stats.diffs, 1);
}

#[test]
fn test_binary_write_passes_through_untracked() {
    let dir = TempDir::new().unwrap();
    let tracker = tracker(&dir);
    let fs = FsHandle::real();
    fs.install_hooks(Arc::clone(&tracker));

    let target = dir.path().join("blob.dat");
    fs.write(&target, &[0u8, 159, 146, 150]).unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), vec![0u8, 159, 146, 150]);
    assert!(tracker.operations().is_empty());
}
