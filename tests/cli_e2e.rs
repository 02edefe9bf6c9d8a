//! End-to-end CLI tests for the linkcard binary.
#![allow(deprecated)]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary invocation isolated from the user's config file.
fn linkcard(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("linkcard").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolve links into reading-list cards"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("linkcard"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_invalid_order_returns_error() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .args(["--order", "sideways", "https://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sideways"));
}

#[test]
fn test_unscrapable_publisher_prints_json_record() {
    let home = TempDir::new().unwrap();
    let output = linkcard(&home)
        .args(["-q", "https://www.wsj.com/articles/markets-rally-on-rate-cut-98765"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let line = String::from_utf8(output).unwrap();
    let record: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(record["title"], "Markets Rally on Rate Cut");
    assert_eq!(record["publisher"], "wsj.com");
    assert_eq!(record["icon_url"], "https://www.wsj.com/favicon.ico");
}

#[test]
fn test_unreachable_url_still_prints_record() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .args(["-q", "--timeout-ms", "300", "http://127.0.0.1:1/offline/path"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#""title":"http://127.0.0.1:1/offline/path""#,
        ));
}

#[test]
fn test_stdin_urls_skip_comments_and_keep_order() {
    let home = TempDir::new().unwrap();
    let output = linkcard(&home)
        .arg("-q")
        .write_stdin(
            "# reading list\n\
             https://www.wsj.com/articles/first-story-1\n\
             \n\
             https://www.washingtonpost.com/politics/second-story\n",
        )
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let titles: Vec<String> = text
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            record["title"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(titles, vec!["First Story", "Second Story"]);
}

#[test]
fn test_empty_stdin_prints_nothing() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .arg("-q")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("linkcard");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "concurrency = 0\n").unwrap();

    linkcard(&home)
        .arg("https://www.wsj.com/articles/story-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let home = TempDir::new().unwrap();
    linkcard(&home)
        .args(["--config"])
        .arg(home.path().join("absent.toml"))
        .arg("https://www.wsj.com/articles/story-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
