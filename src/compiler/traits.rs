//! Compiler trait and artifact types for the external-compiler seam.
//!
//! The harness never looks inside the compiler; it hands over a
//! [`BenchmarkSpec`], gets back a [`CompiledCircuit`] handle, and asks the
//! handle to materialize its constraint system. The sizes do not exist as
//! values until [`CompiledCircuit::load_constraints`] returns them, which
//! makes reading them before materialization unrepresentable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::BenchResult;
use crate::config::BenchmarkSpec;

use super::r1cs;

/// Identity of the compiler that produced an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Handle to a compiled circuit artifact on disk.
#[derive(Debug, Clone)]
pub struct CompiledCircuit {
    /// Path to the R1CS file the compiler emitted
    pub r1cs_path: PathBuf,
    /// Compilation time in milliseconds
    pub compile_time_ms: u128,
    /// Peak compiler RSS in bytes, when sampled
    pub peak_memory_bytes: Option<u64>,
}

impl CompiledCircuit {
    /// Materialize the constraint system: parse the R1CS header and expose
    /// its sizes. Until this completes no counts are available.
    pub fn load_constraints(&self) -> BenchResult<ConstraintSystemSize> {
        let header = r1cs::read_header(&self.r1cs_path)?;
        Ok(ConstraintSystemSize {
            constraint_count: header.n_constraints as u64,
            var_count: header.n_wires as u64,
            pub_output_count: header.n_pub_outputs as u64,
            pub_input_count: header.n_pub_inputs as u64,
            prv_input_count: header.n_prv_inputs as u64,
            label_count: header.n_labels,
        })
    }
}

/// Constraint-system sizes read from a materialized artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystemSize {
    pub constraint_count: u64,
    pub var_count: u64,
    pub pub_output_count: u64,
    pub pub_input_count: u64,
    pub prv_input_count: u64,
    pub label_count: u64,
}

/// An external circuit compiler.
///
/// `compile` blocks until the compiler process finishes or the wall-clock
/// budget runs out; it is the first of the pipeline's two suspension
/// points (the second is `CompiledCircuit::load_constraints`).
pub trait CircuitCompiler: Send + Sync {
    /// Compiler name (e.g. "circom", "mock").
    fn name(&self) -> &str;

    /// Compiler version, if detectable.
    fn version(&self) -> Option<String>;

    /// Compile the circuit named by `spec`, placing artifacts in `outdir`.
    fn compile(&self, spec: &BenchmarkSpec, outdir: &Path) -> BenchResult<CompiledCircuit>;

    fn info(&self) -> CompilerInfo {
        CompilerInfo {
            name: self.name().to_string(),
            version: self.version(),
        }
    }
}
