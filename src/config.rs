//! Harness configuration: benchmark specs, include-path resolution and
//! circuit manifests.
//!
//! The circomlib include directory historically came from an environment
//! variable read at the point of use. Here it is resolved once, up front,
//! into an explicit [`HarnessConfig`] and validated eagerly so a missing
//! path fails with a `Configuration` error before the compiler is invoked.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{BenchError, BenchResult};

/// Environment variable naming the circomlib checkout to compile against.
pub const CIRCOMLIB_ENV: &str = "CIRCOMLIB_PATH";

/// The default circom optimization level (`--O2`, circom's own default).
pub const DEFAULT_OPT_LEVEL: u8 = 2;

/// Default prime field identifier. This is the name circom recognizes for
/// the BN254 scalar field; it is passed through verbatim, never resolved
/// to a numeric modulus here.
pub const DEFAULT_PRIME: &str = "bn128";

/// One benchmark invocation: which circuit to compile and under which
/// compiler settings. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct BenchmarkSpec {
    pub name: String,
    pub circuit_path: PathBuf,
    pub include_paths: Vec<PathBuf>,
    pub prime_field: String,
    pub optimization_level: u8,
}

impl BenchmarkSpec {
    pub fn new(
        name: impl Into<String>,
        circuit_path: impl Into<PathBuf>,
        include_paths: Vec<PathBuf>,
        prime_field: impl Into<String>,
        optimization_level: u8,
    ) -> BenchResult<Self> {
        if optimization_level > 2 {
            return Err(BenchError::Configuration(format!(
                "optimization level must be 0, 1 or 2, got {optimization_level}"
            )));
        }
        Ok(BenchmarkSpec {
            name: name.into(),
            circuit_path: circuit_path.into(),
            include_paths,
            prime_field: prime_field.into(),
            optimization_level,
        })
    }

    /// Return a copy with the circuit path and every include path resolved
    /// to absolute filesystem paths. Fails with a `Configuration` error if
    /// any of them does not exist.
    pub fn resolved(&self) -> BenchResult<BenchmarkSpec> {
        let circuit_path = canonicalize(&self.circuit_path, "circuit")?;
        let include_paths = self
            .include_paths
            .iter()
            .map(|p| canonicalize(p, "include directory"))
            .collect::<BenchResult<Vec<_>>>()?;
        Ok(BenchmarkSpec {
            name: self.name.clone(),
            circuit_path,
            include_paths,
            prime_field: self.prime_field.clone(),
            optimization_level: self.optimization_level,
        })
    }

    /// Default benchmark name: the circuit file stem.
    pub fn name_from_path(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("circuit")
            .to_string()
    }
}

fn canonicalize(path: &Path, what: &str) -> BenchResult<PathBuf> {
    path.canonicalize().map_err(|e| {
        BenchError::Configuration(format!("{what} {} not accessible: {e}", path.display()))
    })
}

/// Resolved include-path configuration shared by every run in a process.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    pub circomlib: Option<PathBuf>,
    pub extra_includes: Vec<PathBuf>,
}

impl HarnessConfig {
    /// Resolve from an explicit flag value with `CIRCOMLIB_PATH` fallback.
    ///
    /// When `requires_circomlib` is set and neither source yields a path,
    /// this is a `Configuration` error — raised here, before any compiler
    /// work happens. Every resolved path must exist and be a directory.
    pub fn resolve(
        circomlib_flag: Option<PathBuf>,
        requires_circomlib: bool,
        extra_includes: Vec<PathBuf>,
    ) -> BenchResult<Self> {
        let circomlib = match circomlib_flag {
            Some(path) => Some(path),
            // Only consult the environment when the circuit needs the
            // library; opted-out runs stay independent of the caller's shell.
            None if requires_circomlib => std::env::var_os(CIRCOMLIB_ENV).map(PathBuf::from),
            None => None,
        };
        if requires_circomlib && circomlib.is_none() {
            return Err(BenchError::Configuration(format!(
                "circuit requires circomlib: pass --circomlib or set {CIRCOMLIB_ENV}"
            )));
        }
        if let Some(dir) = &circomlib {
            validate_dir(dir, "circomlib")?;
        }
        for dir in &extra_includes {
            validate_dir(dir, "include")?;
        }
        Ok(HarnessConfig {
            circomlib,
            extra_includes,
        })
    }

    /// Ordered include list handed to the compiler: extra includes first
    /// (the local templates directory), then circomlib.
    pub fn include_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.extra_includes.clone();
        if let Some(lib) = &self.circomlib {
            paths.push(lib.clone());
        }
        paths
    }
}

fn validate_dir(dir: &Path, what: &str) -> BenchResult<()> {
    if !dir.is_dir() {
        return Err(BenchError::Configuration(format!(
            "{what} path {} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

/// One expanded manifest entry (one circuit at one optimization level).
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub name: String,
    pub path: PathBuf,
    pub prime: String,
    pub optimization_level: u8,
    pub needs_circomlib: bool,
}

#[derive(Debug, Deserialize)]
struct RawCircuit {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub prime: Option<String>,
    #[serde(default)]
    pub opt_levels: Option<Vec<u8>>,
    #[serde(default = "default_true")]
    pub needs_circomlib: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CircuitManifest {
    #[serde(rename = "circuit")]
    pub circuits: Vec<RawCircuit>,
}

/// Load a TOML circuit manifest, expanding each circuit into one entry per
/// listed optimization level (default O2 when none are given).
pub fn load_circuit_manifest(path: &Path) -> BenchResult<Vec<ManifestEntry>> {
    let s = std::fs::read_to_string(path).map_err(|e| BenchError::Message(e.to_string()))?;
    let manifest: CircuitManifest =
        toml::from_str(&s).map_err(|e| BenchError::Message(e.to_string()))?;
    let mut entries: Vec<ManifestEntry> = Vec::new();
    for c in manifest.circuits {
        let prime = c.prime.unwrap_or_else(|| DEFAULT_PRIME.to_string());
        let levels = match c.opt_levels {
            Some(list) if !list.is_empty() => list,
            _ => vec![DEFAULT_OPT_LEVEL],
        };
        for level in levels {
            entries.push(ManifestEntry {
                name: c.name.clone(),
                path: c.path.clone(),
                prime: prime.clone(),
                optimization_level: level,
                needs_circomlib: c.needs_circomlib,
            });
        }
    }
    Ok(entries)
}
