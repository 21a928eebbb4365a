//! The cooldown marker has to survive a process restart

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use oracle_phone::{CooldownGuard, FileMarkerStore, MarkerStore};
use tempfile::TempDir;

fn guard_at(path: &std::path::Path) -> CooldownGuard {
    CooldownGuard::new(Arc::new(FileMarkerStore::new(path)), Duration::from_secs(90))
}

#[test]
fn test_marker_written_by_one_guard_blocks_the_next() {
    tokio_test::block_on(async {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle-phone.cooldown");
        let finished = Utc.with_ymd_and_hms(2024, 5, 4, 18, 0, 0).unwrap();

        guard_at(&path).mark(finished).await;

        // fresh guard, as after a restart
        let restarted = guard_at(&path);
        assert!(restarted.within_cooldown(finished + chrono::Duration::seconds(30)).await);
        assert!(!restarted.within_cooldown(finished + chrono::Duration::seconds(91)).await);
    });
}

#[test]
fn test_marker_file_holds_unix_seconds() {
    tokio_test::block_on(async {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("oracle-phone.cooldown");
        let finished = Utc.with_ymd_and_hms(2024, 5, 4, 18, 0, 0).unwrap();

        guard_at(&path).mark(finished).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        let seconds: f64 = raw.trim().parse().unwrap();
        assert_eq!(seconds, finished.timestamp() as f64);
        assert!(!path.with_extension("tmp").exists());
    });
}

#[test]
fn test_garbage_marker_fails_open() {
    tokio_test::block_on(async {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle-phone.cooldown");
        std::fs::write(&path, "yesterday-ish").unwrap();

        assert!(FileMarkerStore::new(&path).load().await.is_err());
        assert!(!guard_at(&path).within_cooldown(Utc::now()).await);
    });
}

#[test]
fn test_huge_negative_marker_fails_open() {
    tokio_test::block_on(async {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle-phone.cooldown");
        std::fs::write(&path, "-1e30").unwrap();

        let guard = guard_at(&path);
        assert!(!guard.within_cooldown(Utc::now()).await);
        assert_eq!(guard.remaining(Utc::now()).await, None);
    });
}

#[test]
fn test_reset_removes_marker() {
    tokio_test::block_on(async {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oracle-phone.cooldown");
        let guard = guard_at(&path);

        guard.mark(Utc::now()).await;
        assert!(path.exists());

        guard.reset().await.unwrap();
        assert!(!path.exists());
        assert!(!guard.within_cooldown(Utc::now()).await);
        // clearing twice is fine
        guard.reset().await.unwrap();
    });
}
