//! Generic compiler driven by a shell-style command template.
//!
//! Lets the harness benchmark through any circom-compatible wrapper:
//! the template is shlex-split and `{circuit}`, `{outdir}`, `{prime}` and
//! `{O}` placeholders are substituted before spawning.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::config::BenchmarkSpec;
use crate::{BenchError, BenchResult};

use super::circom::{locate_r1cs, run_with_timeout};
use super::traits::{CircuitCompiler, CompiledCircuit};

pub struct GenericCompiler {
    pub command_template: String,
    pub timeout: Duration,
}

impl GenericCompiler {
    pub fn new(command_template: impl Into<String>, timeout: Duration) -> Self {
        GenericCompiler {
            command_template: command_template.into(),
            timeout,
        }
    }

    fn build_command(&self, spec: &BenchmarkSpec, outdir: &Path) -> BenchResult<Command> {
        let mut parts: Vec<String> = shlex::Shlex::new(&self.command_template).collect();
        if parts.is_empty() {
            return Err(BenchError::Configuration("empty command template".into()));
        }
        let circuit = spec.circuit_path.to_string_lossy();
        let out = outdir.to_string_lossy();
        for p in &mut parts {
            *p = p
                .replace("{circuit}", &circuit)
                .replace("{outdir}", &out)
                .replace("{prime}", &spec.prime_field)
                .replace("{O}", &spec.optimization_level.to_string());
        }
        let mut cmd = Command::new(&parts[0]);
        for p in &parts[1..] {
            cmd.arg(p);
        }
        for inc in &spec.include_paths {
            cmd.arg("-l").arg(inc);
        }
        Ok(cmd)
    }
}

impl CircuitCompiler for GenericCompiler {
    fn name(&self) -> &str {
        "generic"
    }

    fn version(&self) -> Option<String> {
        let mut sh = shlex::Shlex::new(&self.command_template);
        let program = sh.next()?;
        crate::env::detect_circom_version_from_path(Path::new(&program))
    }

    fn compile(&self, spec: &BenchmarkSpec, outdir: &Path) -> BenchResult<CompiledCircuit> {
        let cmd = self.build_command(spec, outdir)?;
        let run = run_with_timeout(cmd, outdir, &spec.circuit_path, self.timeout)?;
        if !run.status.success() {
            return Err(BenchError::Compilation {
                circuit: spec.circuit_path.clone(),
                message: format!(
                    "template command exited with {}: {}",
                    run.status,
                    run.stderr.trim()
                ),
            });
        }

        let r1cs_path = locate_r1cs(outdir, &spec.circuit_path).ok_or_else(|| {
            BenchError::Compilation {
                circuit: spec.circuit_path.clone(),
                message: "template command produced no .r1cs file".into(),
            }
        })?;

        Ok(CompiledCircuit {
            r1cs_path,
            compile_time_ms: run.elapsed_ms,
            peak_memory_bytes: run.peak_memory_bytes,
        })
    }
}
