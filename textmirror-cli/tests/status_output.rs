use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use filetime::FileTime;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_config(root: &TempDir, watch_dir: &Path) -> PathBuf {
    let path = root.path().join("config.yaml");
    fs::write(
        &path,
        format!("watch_directories:\n  - {}\n", watch_dir.display()),
    )
    .expect("write config");
    path
}

fn textmirror() -> Command {
    Command::cargo_bin("textmirror").expect("binary built")
}

#[test]
fn status_json_counts_stale_sources() {
    let root = TempDir::new().expect("tempdir");
    let watch = root.path().join("scans");
    fs::create_dir(&watch).expect("mkdir");

    // One source with no mirror at all, one with an up-to-date mirror.
    fs::write(watch.join("unmirrored.pdf"), b"pdf bytes").expect("write");
    fs::write(watch.join("mirrored.pdf"), b"pdf bytes").expect("write");
    fs::write(watch.join("mirrored.txt"), "text").expect("write");
    filetime::set_file_mtime(
        watch.join("mirrored.pdf"),
        FileTime::from_unix_time(1_600_000_000, 0),
    )
    .expect("set mtime");
    filetime::set_file_mtime(
        watch.join("mirrored.txt"),
        FileTime::from_unix_time(1_600_000_010, 0),
    )
    .expect("set mtime");

    let config = write_config(&root, &watch);
    let output = textmirror()
        .arg("status")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .output()
        .expect("run status");
    assert!(output.status.success());

    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid status JSON");
    assert_eq!(payload["summary"]["directories"], 1);
    assert_eq!(payload["summary"]["sources"], 2);
    assert_eq!(payload["summary"]["stale"], 1);

    let sources = payload["directories"][0]["sources"]
        .as_array()
        .expect("sources array");
    let status_of = |name: &str| {
        sources
            .iter()
            .find(|s| s["source"].as_str().is_some_and(|p| p.ends_with(name)))
            .map(|s| s["status"].as_str().unwrap_or_default().to_string())
            .unwrap_or_default()
    };
    assert_eq!(status_of("unmirrored.pdf"), "never_mirrored");
    assert_eq!(status_of("mirrored.pdf"), "mirrored");
}

#[test]
fn status_never_converts_anything() {
    let root = TempDir::new().expect("tempdir");
    let watch = root.path().join("scans");
    fs::create_dir(&watch).expect("mkdir");
    fs::write(watch.join("doc.pdf"), b"pdf bytes").expect("write");

    let config = write_config(&root, &watch);
    textmirror()
        .arg("status")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("NEVER MIRRORED"));

    assert!(
        !watch.join("doc.txt").exists(),
        "status must not write mirrors"
    );
}

#[test]
fn status_flags_missing_directories() {
    let root = TempDir::new().expect("tempdir");
    let watch = root.path().join("never-created");
    let config = write_config(&root, &watch);

    textmirror()
        .arg("status")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("directory missing"));
}
