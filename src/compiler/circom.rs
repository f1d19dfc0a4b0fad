//! Circom compiler implementation.
//!
//! Shells out to the `circom` binary and hands back a handle to the R1CS
//! file it emitted. The invocation mirrors what circuit test harnesses
//! pass to the compiler: `{prime, O, include}` plus `--r1cs`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::BenchmarkSpec;
use crate::{BenchError, BenchResult};

use super::traits::{CircuitCompiler, CompiledCircuit};

/// Configuration for the circom compiler.
#[derive(Debug, Clone)]
pub struct CircomConfig {
    /// Path to the circom binary
    pub circom_path: PathBuf,
    /// Extra arguments appended to every invocation
    pub extra_args: Vec<String>,
    /// Wall-clock budget per compilation; zero means unlimited
    pub timeout: Duration,
}

impl Default for CircomConfig {
    fn default() -> Self {
        CircomConfig {
            circom_path: PathBuf::from("circom"),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(100),
        }
    }
}

impl CircomConfig {
    pub fn new(circom_path: impl Into<PathBuf>) -> Self {
        CircomConfig {
            circom_path: circom_path.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// External circom compiler invoked as a subprocess.
pub struct CircomCompiler {
    config: CircomConfig,
}

impl CircomCompiler {
    pub fn new(config: CircomConfig) -> Self {
        CircomCompiler { config }
    }

    pub fn from_path(circom_path: impl Into<PathBuf>) -> Self {
        Self::new(CircomConfig::new(circom_path))
    }
}

impl CircuitCompiler for CircomCompiler {
    fn name(&self) -> &str {
        "circom"
    }

    fn version(&self) -> Option<String> {
        crate::env::detect_circom_version_from_path(&self.config.circom_path)
    }

    fn compile(&self, spec: &BenchmarkSpec, outdir: &Path) -> BenchResult<CompiledCircuit> {
        let mut cmd = Command::new(&self.config.circom_path);
        cmd.arg(&spec.circuit_path)
            .arg("--r1cs")
            .arg("-p")
            .arg(&spec.prime_field)
            .arg(format!("--O{}", spec.optimization_level))
            .arg("-o")
            .arg(outdir);
        for inc in &spec.include_paths {
            cmd.arg("-l").arg(inc);
        }
        for arg in &self.config.extra_args {
            cmd.arg(arg);
        }

        let run = run_with_timeout(cmd, outdir, &spec.circuit_path, self.config.timeout)?;
        if !run.status.success() {
            return Err(BenchError::Compilation {
                circuit: spec.circuit_path.clone(),
                message: format!("circom exited with {}: {}", run.status, run.stderr.trim()),
            });
        }

        let r1cs_path = locate_r1cs(outdir, &spec.circuit_path).ok_or_else(|| {
            BenchError::Compilation {
                circuit: spec.circuit_path.clone(),
                message: "compiler reported success but produced no .r1cs file".into(),
            }
        })?;

        Ok(CompiledCircuit {
            r1cs_path,
            compile_time_ms: run.elapsed_ms,
            peak_memory_bytes: run.peak_memory_bytes,
        })
    }
}

/// Result of one supervised compiler run.
pub(super) struct RunOutcome {
    pub status: std::process::ExitStatus,
    pub stderr: String,
    pub peak_memory_bytes: Option<u64>,
    pub elapsed_ms: u128,
}

/// Run a compiler command with a kill-on-deadline timeout and optional
/// peak-RSS sampling. Stderr goes to a file in `outdir` so a chatty
/// compiler can never block on a full pipe.
pub(super) fn run_with_timeout(
    mut cmd: Command,
    outdir: &Path,
    circuit: &Path,
    timeout: Duration,
) -> BenchResult<RunOutcome> {
    #[cfg(feature = "mem")]
    use sysinfo::{ProcessRefreshKind, RefreshKind, System};

    let stderr_path = outdir.join("compiler.stderr");
    let stderr_file = std::fs::File::create(&stderr_path)
        .map_err(|e| BenchError::Message(format!("failed to create stderr capture: {e}")))?;

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr_file));

    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| BenchError::Message(format!("failed to spawn compiler: {e}")))?;

    #[cfg(feature = "mem")]
    let mut sys = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );
    #[cfg(feature = "mem")]
    let mut peak_rss: u64 = 0;

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| BenchError::Message(e.to_string()))?
        {
            let elapsed_ms = start.elapsed().as_millis();
            let stderr = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            return Ok(RunOutcome {
                status,
                stderr,
                peak_memory_bytes: {
                    #[cfg(feature = "mem")]
                    {
                        Some(peak_rss)
                    }
                    #[cfg(not(feature = "mem"))]
                    {
                        None
                    }
                },
                elapsed_ms,
            });
        }

        if timeout.as_secs() > 0 && start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BenchError::Timeout {
                circuit: circuit.to_path_buf(),
                budget_secs: timeout.as_secs(),
            });
        }

        #[cfg(feature = "mem")]
        {
            if let Some(pid) = child.id().try_into().ok().map(sysinfo::Pid::from_u32) {
                sys.refresh_process(pid);
                if let Some(p) = sys.process(pid) {
                    peak_rss = peak_rss.max(p.memory());
                }
            }
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Find the R1CS file the compiler wrote: `<stem>.r1cs` under `outdir`,
/// falling back to the first `.r1cs` file present.
pub(super) fn locate_r1cs(outdir: &Path, circuit: &Path) -> Option<PathBuf> {
    if let Some(stem) = circuit.file_stem() {
        let candidate = outdir.join(stem).with_extension("r1cs");
        if candidate.exists() {
            return Some(candidate);
        }
    }
    std::fs::read_dir(outdir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "r1cs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_r1cs_prefers_stem_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.r1cs"), b"x").unwrap();
        std::fs::write(dir.path().join("concat_check.r1cs"), b"x").unwrap();

        let found = locate_r1cs(dir.path(), Path::new("/src/concat_check.circom")).unwrap();
        assert_eq!(found.file_name().unwrap(), "concat_check.r1cs");
    }

    #[test]
    fn test_locate_r1cs_falls_back_to_any() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("renamed.r1cs"), b"x").unwrap();

        let found = locate_r1cs(dir.path(), Path::new("main.circom")).unwrap();
        assert_eq!(found.file_name().unwrap(), "renamed.r1cs");
    }

    #[test]
    fn test_locate_r1cs_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_r1cs(dir.path(), Path::new("main.circom")).is_none());
    }
}
