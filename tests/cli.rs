use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn buddha() -> Command {
    Command::cargo_bin("buddha").unwrap()
}

#[test]
fn tiny_render_is_a_plain_pgm_grid() {
    let out = buddha()
        .args(&["--size", "4x3", "--points", "1", "--iterations", "1", "--threads", "2"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("P2 4 3 255"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.split(' ').count() == 4));
}

#[test]
fn small_render_has_the_expected_header() {
    buddha()
        .args(&["-s", "16", "-p", "2000", "-i", "100", "-t", "2", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("P2 16 16 255\n"));
}

#[test]
fn writes_png_and_plain_files() {
    let dir = tempdir().unwrap();
    for name in &["out.png", "out.pgm", "out.pnm"] {
        let path = dir.path().join(name);
        buddha()
            .args(&["-s", "8", "-p", "500", "-i", "50", "-t", "2"])
            .arg("-o")
            .arg(&path)
            .assert()
            .success();
        assert!(fs::metadata(&path).unwrap().len() > 0, "{} is empty", name);
    }
    let plain = fs::read_to_string(dir.path().join("out.pgm")).unwrap();
    assert!(plain.starts_with("P2 8 8 255\n"));
}

#[test]
fn thread_count_defaults_to_the_cpu_count() {
    buddha()
        .args(&["-s", "6x4", "-p", "200", "-i", "20", "-v"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("P2 6 4 255\n"))
        .stderr(predicate::str::contains(format!(
            "with {} threads",
            num_cpus::get()
        )));
}

#[test]
fn rejects_zero_threads() {
    buddha()
        .args(&["--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Thread count must be at least 1"));
}

#[test]
fn rejects_non_numeric_points() {
    buddha()
        .args(&["--points", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse Point count"));
}

#[test]
fn rejects_inverted_window() {
    buddha()
        .args(&["-p", "1", "--window-leftlower=1.0,1.5", "--window-rightupper=-2.0,-1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("visualization window"));
}

#[test]
fn rejects_unknown_output_format() {
    let dir = tempdir().unwrap();
    buddha()
        .args(&["-s", "4", "-p", "1", "-i", "1", "-t", "1"])
        .arg("-o")
        .arg(dir.path().join("out.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported output format"));
}
