//! The benchmark harness: compile one circuit, materialize its constraint
//! system, report the size.
//!
//! The pipeline is straight-line with two external suspension points
//! (compile, then load-constraints); there is no state machine and no
//! shared mutable state between runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::compiler::{
    CircomCompiler, CircomConfig, CircuitCompiler, CompiledCircuit, ConstraintSystemSize,
    GenericCompiler,
};
use crate::config::{BenchmarkSpec, HarnessConfig};
use crate::env::EnvironmentInfo;
use crate::{BenchResult, CommonMeta, SCHEMA_VERSION, SizeReport};

/// The two-step measurement core: compile, then materialize constraints.
/// Counts are not readable before the second step completes.
pub fn measure(
    compiler: &dyn CircuitCompiler,
    spec: &BenchmarkSpec,
    outdir: &Path,
) -> BenchResult<(CompiledCircuit, ConstraintSystemSize)> {
    debug!(
        circuit = %spec.circuit_path.display(),
        prime = %spec.prime_field,
        opt_level = spec.optimization_level,
        "compiling"
    );
    let artifact = compiler.compile(spec, outdir)?;
    debug!(r1cs = %artifact.r1cs_path.display(), "materializing constraints");
    let size = artifact.load_constraints()?;
    Ok((artifact, size))
}

fn build_report(
    spec: &BenchmarkSpec,
    compiler: &dyn CircuitCompiler,
    artifact: &CompiledCircuit,
    size: &ConstraintSystemSize,
    system: Option<EnvironmentInfo>,
) -> SizeReport {
    let circuit_sha256 = std::fs::read(&spec.circuit_path)
        .ok()
        .map(|bytes| crate::sha256_hex(&bytes));
    let compiler_info = compiler.info();
    let meta = CommonMeta {
        name: spec.name.clone(),
        timestamp: crate::now_string(),
        compiler_version: compiler_info.version.clone().unwrap_or_default(),
        circuit_path: spec.circuit_path.clone(),
        cli_args: std::env::args().collect(),
        circuit_sha256,
    };
    SizeReport {
        schema_version: SCHEMA_VERSION,
        meta,
        prime: spec.prime_field.clone(),
        optimization_level: spec.optimization_level,
        constraint_count: size.constraint_count,
        var_count: size.var_count,
        pub_output_count: size.pub_output_count,
        pub_input_count: size.pub_input_count,
        prv_input_count: size.prv_input_count,
        label_count: size.label_count,
        compile_time_ms: artifact.compile_time_ms,
        peak_memory_bytes: artifact.peak_memory_bytes,
        compiler: compiler_info,
        system,
    }
}

/// Run one benchmark against an already-constructed compiler.
///
/// Include-path configuration is resolved and validated before the
/// compiler is touched, so a missing circomlib path fails here without a
/// wasted compilation attempt.
pub fn run_with_compiler(
    compiler: &dyn CircuitCompiler,
    circuit: PathBuf,
    name: Option<String>,
    prime: &str,
    opt_level: u8,
    circomlib: Option<PathBuf>,
    requires_circomlib: bool,
    extra_includes: Vec<PathBuf>,
    system: Option<EnvironmentInfo>,
    json_out: Option<PathBuf>,
) -> BenchResult<SizeReport> {
    let config = HarnessConfig::resolve(circomlib, requires_circomlib, extra_includes)?;
    let name = name.unwrap_or_else(|| BenchmarkSpec::name_from_path(&circuit));
    let spec = BenchmarkSpec::new(
        name,
        circuit,
        config.include_paths(),
        prime,
        opt_level,
    )?
    .resolved()?;

    let outdir = tempfile::tempdir()
        .map_err(|e| crate::BenchError::Message(format!("failed to create temp dir: {e}")))?;
    let (artifact, size) = measure(compiler, &spec, outdir.path())?;

    let report = build_report(&spec, compiler, &artifact, &size, system);

    if let Some(json_path) = json_out {
        crate::write_json(&json_path, &report)?;
    }

    info!(
        name = %report.meta.name,
        constraints = report.constraint_count,
        vars = report.var_count,
        compile_ms = report.compile_time_ms as u64,
        "size report"
    );
    println!(
        "{}: {} constraints, {} vars",
        report.meta.name, report.constraint_count, report.var_count
    );
    Ok(report)
}

/// CLI entry point: pick the compiler (template or circom binary), then
/// run the single-circuit pipeline.
#[allow(clippy::too_many_arguments)]
pub fn run(
    circuit: PathBuf,
    name: Option<String>,
    prime: String,
    opt_level: u8,
    circomlib: Option<PathBuf>,
    no_circomlib: bool,
    include: Vec<PathBuf>,
    compiler_path: Option<PathBuf>,
    template: Option<String>,
    compiler_args: Vec<String>,
    timeout_secs: u64,
    json_out: Option<PathBuf>,
) -> BenchResult<SizeReport> {
    let timeout = Duration::from_secs(timeout_secs);
    let compiler: Box<dyn CircuitCompiler> = match template {
        Some(tpl) => Box::new(GenericCompiler::new(tpl, timeout)),
        None => {
            let path = compiler_path.unwrap_or_else(|| PathBuf::from("circom"));
            Box::new(CircomCompiler::new(
                CircomConfig::new(path)
                    .with_args(compiler_args)
                    .with_timeout(timeout),
            ))
        }
    };
    let system = Some(EnvironmentInfo::detect());
    run_with_compiler(
        compiler.as_ref(),
        circuit,
        name,
        &prime,
        opt_level,
        circomlib,
        !no_circomlib,
        include,
        system,
        json_out,
    )
}
