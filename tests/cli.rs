//! Exercises the compiled binary: output files, partial-failure batches and
//! the exit-code policy.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn write_region_csv(dir: &Path, region: &str, base: f64) -> PathBuf {
    let mut contents = String::from("Timestamp,GHI,Tamb\n");
    for hour in 6..18 {
        contents.push_str(&format!(
            "2021-08-09 {:02}:00:00,{:.1},25.0\n",
            hour,
            base + hour as f64
        ));
    }
    let path = dir.join(format!("{}.csv", region));
    std::fs::write(&path, contents).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_solar-survey"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn full_batch_exits_zero_and_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    let benin = write_region_csv(dir.path(), "benin", 200.0);
    let togo = write_region_csv(dir.path(), "togo", 150.0);
    let out_dir = dir.path().join("out");

    let output = run(&[
        "--region",
        &format!("benin={}", benin.display()),
        "--region",
        &format!("togo={}", togo.display()),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--no-charts",
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out_dir.join("summary.csv").exists());
    assert!(out_dir.join("report.json").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Region ranking by mean GHI"));
    assert!(stdout.contains("1. benin"));
    assert!(stdout.contains("2. togo"));
}

#[test]
fn failed_region_yields_nonzero_exit_but_reports_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let benin = write_region_csv(dir.path(), "benin", 200.0);
    let missing = dir.path().join("absent.csv");
    let out_dir = dir.path().join("out");

    let output = run(&[
        "--region",
        &format!("benin={}", benin.display()),
        "--region",
        &format!("togo={}", missing.display()),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--no-charts",
    ]);

    assert!(!output.status.success());

    // The surviving region is still analyzed, ranked and written out.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. benin"));
    assert!(out_dir.join("summary.csv").exists());
    let report = std::fs::read_to_string(out_dir.join("report.json")).unwrap();
    assert!(report.contains("failed_regions"));
    assert!(report.contains("togo"));
}

#[test]
fn export_clean_writes_per_region_files() {
    let dir = tempfile::tempdir().unwrap();
    let benin = write_region_csv(dir.path(), "benin", 200.0);
    let out_dir = dir.path().join("out");

    let output = run(&[
        "--region",
        &format!("benin={}", benin.display()),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--no-charts",
        "--export-clean",
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out_dir.join("benin_clean.csv").exists());
    assert!(out_dir.join("benin_clean.parquet").exists());
}

#[test]
fn malformed_bounds_argument_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let benin = write_region_csv(dir.path(), "benin", 200.0);

    let output = run(&[
        "--region",
        &format!("benin={}", benin.display()),
        "--bounds",
        "GHI=10..5",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty range"));
}
