use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_lists_bench_commands() {
    let mut cmd = Command::cargo_bin("oracle-phone").unwrap();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ring"))
        .stdout(predicate::str::contains("light"))
        .stdout(predicate::str::contains("watch-motion"))
        .stdout(predicate::str::contains("rehearse"))
        .stdout(predicate::str::contains("reset-cooldown"));
}

#[test]
fn test_reset_cooldown_deletes_marker() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("oracle-phone.cooldown");
    std::fs::write(&marker, "1714845600.000").unwrap();
    let config = dir.path().join("bench.toml");
    std::fs::write(
        &config,
        format!(
            "[cooldown]\nmarker_path = \"{}\"\n\n[observability]\njson_logs = false\n",
            marker.display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("oracle-phone").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("reset-cooldown")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cooldown cleared"));

    assert!(!marker.exists());
}

#[test]
fn test_invalid_config_fails_before_touching_hardware() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[call]\ntarget = \"  \"\n").unwrap();

    let mut cmd = Command::cargo_bin("oracle-phone").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("call.target"));
}
