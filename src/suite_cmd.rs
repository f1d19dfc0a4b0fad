//! Sequential suite runner.
//!
//! Runs each configured circuit one at a time — the compiler allocates
//! whatever working memory the circuit needs, and these benchmarks target
//! full-size circuits, so only one artifact is alive at any moment. A
//! failing benchmark is reported and the suite moves on; the suite as a
//! whole fails if any run failed.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::compiler::{CircomCompiler, CircomConfig};
use crate::config::{self, DEFAULT_OPT_LEVEL, DEFAULT_PRIME};
use crate::env::EnvironmentInfo;
use crate::storage::{CsvExporter, JsonlWriter};
use crate::{BenchError, BenchResult, SizeReport};

#[derive(Debug, Deserialize)]
struct SuiteCircuit {
    name: Option<String>,
    path: PathBuf,
    prime: Option<String>,
    opt_level: Option<u8>,
    #[serde(default = "default_true")]
    needs_circomlib: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SuiteConfig {
    #[serde(default)]
    circuits: Vec<SuiteCircuit>,
    /// Optional TOML circuit manifest contributing further entries
    manifest: Option<PathBuf>,
    circomlib: Option<PathBuf>,
    #[serde(default)]
    includes: Vec<PathBuf>,
    compiler_path: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

pub fn run(
    config_path: PathBuf,
    circomlib_flag: Option<PathBuf>,
    jsonl_out: Option<PathBuf>,
    csv_out: Option<PathBuf>,
    summary_out: Option<PathBuf>,
) -> BenchResult<()> {
    let bytes = std::fs::read(&config_path).map_err(|e| BenchError::Message(e.to_string()))?;
    let cfg: SuiteConfig =
        serde_yaml::from_slice(&bytes).map_err(|e| BenchError::Message(e.to_string()))?;

    let mut entries: Vec<config::ManifestEntry> = cfg
        .circuits
        .iter()
        .map(|c| config::ManifestEntry {
            name: c
                .name
                .clone()
                .unwrap_or_else(|| config::BenchmarkSpec::name_from_path(&c.path)),
            path: c.path.clone(),
            prime: c.prime.clone().unwrap_or_else(|| DEFAULT_PRIME.to_string()),
            optimization_level: c.opt_level.unwrap_or(DEFAULT_OPT_LEVEL),
            needs_circomlib: c.needs_circomlib,
        })
        .collect();
    if let Some(manifest) = &cfg.manifest {
        entries.extend(config::load_circuit_manifest(manifest)?);
    }
    if entries.is_empty() {
        return Err(BenchError::Configuration(
            "suite config lists no circuits".into(),
        ));
    }

    let compiler_path = cfg
        .compiler_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("circom"));
    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(100));
    let compiler = CircomCompiler::new(CircomConfig::new(&compiler_path).with_timeout(timeout));

    let circomlib = circomlib_flag.or(cfg.circomlib.clone());
    let system = EnvironmentInfo::detect_with_circom_path(Some(&compiler_path));

    let jsonl = jsonl_out.map(JsonlWriter::new);
    let mut reports: Vec<SizeReport> = Vec::new();
    let mut failures: Vec<String> = Vec::new();

    let total = entries.len();
    for entry in entries {
        info!(name = %entry.name, opt_level = entry.optimization_level, "running benchmark");
        let result = crate::size_cmd::run_with_compiler(
            &compiler,
            entry.path.clone(),
            Some(entry.name.clone()),
            &entry.prime,
            entry.optimization_level,
            circomlib.clone(),
            entry.needs_circomlib,
            cfg.includes.clone(),
            Some(system.clone()),
            None,
        );
        match result {
            Ok(report) => {
                if let Some(writer) = &jsonl {
                    writer.append(&report)?;
                }
                reports.push(report);
            }
            Err(e) => {
                error!(name = %entry.name, error = %e, "benchmark failed");
                failures.push(entry.name);
            }
        }
    }

    if let Some(csv_path) = csv_out {
        CsvExporter::new().export(&reports, &csv_path)?;
    }
    if let Some(summary_path) = summary_out {
        let summary = serde_json::json!({
            "results": reports,
            "failures": failures,
        });
        crate::write_json(&summary_path, &summary)?;
    }

    if !failures.is_empty() {
        return Err(BenchError::Message(format!(
            "{} of {} benchmarks failed: {}",
            failures.len(),
            total,
            failures.join(", ")
        )));
    }
    Ok(())
}
