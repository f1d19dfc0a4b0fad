use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use circom_bench::BenchError;
use circom_bench::compiler::r1cs::{R1csHeader, write_header};
use tempfile::tempdir;

/// Write a fake circom binary: a shell script that honors `--version`,
/// parses `-o`, and drops a pre-built R1CS fixture into the output dir.
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

fn write_circuit(dir: &Path) -> PathBuf {
    let path = dir.join("concat_check.circom");
    fs::write(&path, "template ConcatCheck(n) {}\ncomponent main = ConcatCheck(16);\n").unwrap();
    path
}

#[test]
fn size_with_fake_compiler() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("fixture.r1cs");
    let mut header = R1csHeader::bn128(26060, 26573);
    header.n_pub_outputs = 1;
    header.n_prv_inputs = 512;
    write_header(&fixture, &header).unwrap();

    let compiler = write_fake_compiler(dir.path(), &fixture);
    let circuit = write_circuit(dir.path());
    let json_out = dir.path().join("report.json");

    let report = circom_bench::size_cmd::run(
        circuit,
        None,
        "bn128".into(),
        2,
        None,
        true, // no circomlib needed
        vec![],
        Some(compiler),
        None,
        vec![],
        30,
        Some(json_out.clone()),
    )
    .unwrap();

    assert_eq!(report.constraint_count, 26060);
    assert_eq!(report.var_count, 26573);
    assert_eq!(report.pub_output_count, 1);
    assert_eq!(report.prv_input_count, 512);
    assert_eq!(report.compiler.name, "circom");
    assert_eq!(report.compiler.version.as_deref(), Some("fake circom 0.0.1"));

    // Report written to disk is the same data
    let parsed: circom_bench::SizeReport =
        serde_json::from_slice(&fs::read(&json_out).unwrap()).unwrap();
    assert_eq!(parsed.constraint_count, 26060);
    assert_eq!(parsed.optimization_level, 2);
    assert_eq!(parsed.prime, "bn128");
}

#[test]
fn size_repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("fixture.r1cs");
    write_header(&fixture, &R1csHeader::bn128(512, 700)).unwrap();
    let compiler = write_fake_compiler(dir.path(), &fixture);
    let circuit = write_circuit(dir.path());

    let run = || {
        circom_bench::size_cmd::run(
            circuit.clone(),
            None,
            "bn128".into(),
            1,
            None,
            true,
            vec![],
            Some(compiler.clone()),
            None,
            vec![],
            30,
            None,
        )
        .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.constraint_count, second.constraint_count);
    assert_eq!(first.var_count, second.var_count);
}

#[test]
fn compilation_failure_propagates() {
    let dir = tempdir().unwrap();
    let compiler = dir.path().join("broken_circom.sh");
    fs::write(
        &compiler,
        "#!/usr/bin/env bash\necho 'error: unresolved template Missing()' >&2\nexit 1\n",
    )
    .unwrap();
    let mut perms = fs::metadata(&compiler).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&compiler, perms).unwrap();
    let circuit = write_circuit(dir.path());

    let err = circom_bench::size_cmd::run(
        circuit,
        None,
        "bn128".into(),
        2,
        None,
        true,
        vec![],
        Some(compiler),
        None,
        vec![],
        30,
        None,
    )
    .unwrap_err();

    match err {
        BenchError::Compilation { message, .. } => {
            assert!(message.contains("unresolved template"), "got: {message}");
        }
        other => panic!("expected Compilation error, got {other}"),
    }
}

#[test]
fn timeout_kills_the_compiler() {
    let dir = tempdir().unwrap();
    let compiler = dir.path().join("slow_circom.sh");
    fs::write(&compiler, "#!/usr/bin/env bash\nsleep 30\n").unwrap();
    let mut perms = fs::metadata(&compiler).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&compiler, perms).unwrap();
    let circuit = write_circuit(dir.path());

    let err = circom_bench::size_cmd::run(
        circuit,
        None,
        "bn128".into(),
        2,
        None,
        true,
        vec![],
        Some(compiler),
        None,
        vec![],
        1,
        None,
    )
    .unwrap_err();

    assert!(matches!(err, BenchError::Timeout { budget_secs: 1, .. }));
}

#[test]
fn generic_template_compiler() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("fixture.r1cs");
    write_header(&fixture, &R1csHeader::bn128(99, 101)).unwrap();
    let compiler = write_fake_compiler(dir.path(), &fixture);
    let circuit = write_circuit(dir.path());

    let template = format!("{} {{circuit}} -p {{prime}} --O{{O}} -o {{outdir}}", compiler.display());
    let report = circom_bench::size_cmd::run(
        circuit,
        Some("templated".into()),
        "bn128".into(),
        2,
        None,
        true,
        vec![],
        None,
        Some(template),
        vec![],
        30,
        None,
    )
    .unwrap();

    assert_eq!(report.meta.name, "templated");
    assert_eq!(report.constraint_count, 99);
    assert_eq!(report.compiler.name, "generic");
}
