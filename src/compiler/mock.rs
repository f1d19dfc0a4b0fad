//! Mock compiler for testing.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::BenchmarkSpec;
use crate::{BenchError, BenchResult};

use super::r1cs::{self, R1csHeader};
use super::traits::{CircuitCompiler, CompiledCircuit};

/// Configuration for mock compiler responses.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Name to report
    pub name: String,
    /// Version to report
    pub version: Option<String>,
    /// Header to synthesize into the mock artifact
    pub header: R1csHeader,
    /// Whether compile should fail
    pub compile_fails: bool,
}

impl MockConfig {
    pub fn new(name: impl Into<String>) -> Self {
        MockConfig {
            name: name.into(),
            version: Some("mock-1.0.0".to_string()),
            header: R1csHeader::bn128(1000, 1200),
            compile_fails: false,
        }
    }

    pub fn with_counts(mut self, constraints: u32, wires: u32) -> Self {
        self.header = R1csHeader::bn128(constraints, wires);
        self
    }

    pub fn compile_fails(mut self) -> Self {
        self.compile_fails = true;
        self
    }
}

/// Mock compiler for unit testing.
///
/// Synthesizes a real header-only R1CS file so the materialization step is
/// exercised end to end, and records whether compile was invoked so tests
/// can assert configuration errors happen first.
pub struct MockCompiler {
    config: MockConfig,
    invoked: AtomicBool,
}

impl MockCompiler {
    pub fn new(config: MockConfig) -> Self {
        MockCompiler {
            config,
            invoked: AtomicBool::new(false),
        }
    }

    pub fn with_counts(constraints: u32, wires: u32) -> Self {
        Self::new(MockConfig::new("mock").with_counts(constraints, wires))
    }

    /// Whether compile has been called on this instance.
    pub fn was_invoked(&self) -> bool {
        self.invoked.load(Ordering::SeqCst)
    }
}

impl CircuitCompiler for MockCompiler {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn version(&self) -> Option<String> {
        self.config.version.clone()
    }

    fn compile(&self, spec: &BenchmarkSpec, outdir: &Path) -> BenchResult<CompiledCircuit> {
        self.invoked.store(true, Ordering::SeqCst);
        if self.config.compile_fails {
            return Err(BenchError::Compilation {
                circuit: spec.circuit_path.clone(),
                message: "mock compile failed".into(),
            });
        }
        let r1cs_path = outdir.join(format!("{}.r1cs", spec.name));
        r1cs::write_header(&r1cs_path, &self.config.header)?;
        Ok(CompiledCircuit {
            r1cs_path,
            compile_time_ms: 1,
            peak_memory_bytes: None,
        })
    }
}
