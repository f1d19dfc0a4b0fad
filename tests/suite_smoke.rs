use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use circom_bench::compiler::r1cs::{R1csHeader, write_header};
use circom_bench::storage::JsonlWriter;
use tempfile::tempdir;

fn write_fake_compiler(dir: &Path, fixture: &Path) -> PathBuf {
    let path = dir.join("fake_circom.sh");
    let script = format!(
        r#"#!/usr/bin/env bash
set -euo pipefail
if [ "${{1:-}}" = "--version" ]; then echo "fake circom 0.0.1"; exit 0; fi
out="."
while [ "$#" -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift 2; else shift 1; fi
done
cp "{fixture}" "$out/bench.r1cs"
"#,
        fixture = fixture.display(),
    );
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
fn suite_runs_sequentially_and_persists_reports() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("fixture.r1cs");
    write_header(&fixture, &R1csHeader::bn128(1000, 1100)).unwrap();
    let compiler = write_fake_compiler(dir.path(), &fixture);

    let concat = dir.path().join("concat_check.circom");
    let sha = dir.path().join("sha256_compression.circom");
    fs::write(&concat, "template ConcatCheck() {}\n").unwrap();
    fs::write(&sha, "template Sha256Compression() {}\n").unwrap();

    let config_path = dir.path().join("suite.yaml");
    fs::write(
        &config_path,
        format!(
            r#"
compiler_path: {compiler}
timeout_secs: 30
circuits:
  - path: {concat}
    opt_level: 2
    needs_circomlib: false
  - name: sha256_o1
    path: {sha}
    opt_level: 1
    needs_circomlib: false
"#,
            compiler = compiler.display(),
            concat = concat.display(),
            sha = sha.display(),
        ),
    )
    .unwrap();

    let jsonl_path = dir.path().join("out/sizes.jsonl");
    let csv_path = dir.path().join("out/sizes.csv");
    let summary_path = dir.path().join("out/summary.json");

    circom_bench::suite_cmd::run(
        config_path,
        None,
        Some(jsonl_path.clone()),
        Some(csv_path.clone()),
        Some(summary_path.clone()),
    )
    .unwrap();

    let reports = JsonlWriter::new(&jsonl_path).read_all().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].meta.name, "concat_check");
    assert_eq!(reports[1].meta.name, "sha256_o1");
    assert_eq!(reports[1].optimization_level, 1);
    assert!(reports.iter().all(|r| r.constraint_count == 1000));
    assert!(reports.iter().all(|r| r.var_count >= 1));

    let csv_text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv_text.lines().count(), 3); // header + 2 rows

    let summary: serde_json::Value =
        serde_json::from_slice(&fs::read(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["results"].as_array().unwrap().len(), 2);
    assert_eq!(summary["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn suite_continues_past_failures_and_exits_nonzero() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("fixture.r1cs");
    write_header(&fixture, &R1csHeader::bn128(7, 9)).unwrap();
    let compiler = write_fake_compiler(dir.path(), &fixture);

    let good = dir.path().join("good.circom");
    fs::write(&good, "template Good() {}\n").unwrap();

    let config_path = dir.path().join("suite.yaml");
    fs::write(
        &config_path,
        format!(
            r#"
compiler_path: {compiler}
circuits:
  - path: {missing}
    needs_circomlib: false
  - path: {good}
    needs_circomlib: false
"#,
            compiler = compiler.display(),
            missing = dir.path().join("missing.circom").display(),
            good = good.display(),
        ),
    )
    .unwrap();

    let jsonl_path = dir.path().join("sizes.jsonl");
    let err = circom_bench::suite_cmd::run(
        config_path,
        None,
        Some(jsonl_path.clone()),
        None,
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("1 of 2 benchmarks failed"));

    // The good circuit still ran and was persisted
    let reports = JsonlWriter::new(&jsonl_path).read_all().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].meta.name, "good");
}

#[test]
fn suite_with_no_circuits_is_configuration_error() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("suite.yaml");
    fs::write(&config_path, "circuits: []\n").unwrap();

    let err = circom_bench::suite_cmd::run(config_path, None, None, None, None).unwrap_err();
    assert!(matches!(err, circom_bench::BenchError::Configuration(_)));
}
