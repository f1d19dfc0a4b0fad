pub mod compare_cmd;
pub mod compiler;
pub mod config;
pub mod env;
pub mod size_cmd;
pub mod storage;
pub mod suite_cmd;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use storage::JsonlWriter;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Missing or invalid environment/path input, detected before the
    /// compiler is ever invoked.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The external compiler rejected the circuit.
    #[error("compilation of {circuit} failed: {message}")]
    Compilation { circuit: PathBuf, message: String },
    /// The compiler exceeded the wall-clock budget; the process was killed
    /// and no partial report is produced.
    #[error("compilation of {circuit} timed out after {budget_secs}s")]
    Timeout { circuit: PathBuf, budget_secs: u64 },
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

/// Schema version stamped on every report line.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonMeta {
    pub name: String,
    pub timestamp: String,
    pub compiler_version: String,
    pub circuit_path: PathBuf,
    pub cli_args: Vec<String>,
    pub circuit_sha256: Option<String>,
}

/// Size report for one compiled circuit: the constraint-system metrics
/// plus enough metadata to reproduce the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(flatten)]
    pub meta: CommonMeta,
    pub prime: String,
    pub optimization_level: u8,
    pub constraint_count: u64,
    pub var_count: u64,
    pub pub_output_count: u64,
    pub pub_input_count: u64,
    pub prv_input_count: u64,
    pub label_count: u64,
    pub compile_time_ms: u128,
    pub peak_memory_bytes: Option<u64>,
    pub compiler: compiler::CompilerInfo,
    pub system: Option<env::EnvironmentInfo>,
}

// Shared helpers
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha256::digest;
    digest(bytes)
}

pub fn now_string() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".to_string())
}

pub fn write_json<T: serde::Serialize>(path: &std::path::Path, value: &T) -> BenchResult<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| BenchError::Message(e.to_string()))?;
        }
    }
    let json = serde_json::to_vec_pretty(value).map_err(|e| BenchError::Message(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| BenchError::Message(e.to_string()))
}
