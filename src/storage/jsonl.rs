//! JSONL (JSON Lines) storage for size reports.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::{BenchError, SCHEMA_VERSION, SizeReport};

/// JSONL writer/reader for size reports.
///
/// Each report is stored as a single JSON line, making it easy to append
/// and stream records without loading the entire file.
#[derive(Debug, Clone)]
pub struct JsonlWriter {
    path: PathBuf,
}

impl JsonlWriter {
    /// Create a new JsonlWriter for the given path.
    ///
    /// The file will be created if it doesn't exist when writing.
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonlWriter {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single report to the JSONL file.
    pub fn append(&self, report: &SizeReport) -> Result<(), BenchError> {
        if report.schema_version != SCHEMA_VERSION {
            return Err(BenchError::Message(format!(
                "schema version mismatch: report has v{}, expected v{}",
                report.schema_version, SCHEMA_VERSION
            )));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BenchError::Message(format!("failed to open file: {e}")))?;

        let json = serde_json::to_string(report)
            .map_err(|e| BenchError::Message(format!("failed to serialize report: {e}")))?;

        writeln!(file, "{}", json)
            .map_err(|e| BenchError::Message(format!("failed to write report: {e}")))?;

        Ok(())
    }

    /// Read all reports from the JSONL file.
    pub fn read_all(&self) -> Result<Vec<SizeReport>, BenchError> {
        self.read_filtered(None)
    }

    /// Read reports, optionally filtered by benchmark name.
    pub fn read_filtered(&self, name: Option<&str>) -> Result<Vec<SizeReport>, BenchError> {
        if !self.path.exists() {
            return Err(BenchError::Message(format!(
                "file not found: {}",
                self.path.display()
            )));
        }

        let file = File::open(&self.path)
            .map_err(|e| BenchError::Message(format!("failed to open file: {e}")))?;

        let reader = BufReader::new(file);
        let mut reports = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| {
                BenchError::Message(format!("failed to read line {}: {e}", line_num + 1))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let report: SizeReport = serde_json::from_str(&line).map_err(|e| {
                BenchError::Message(format!("failed to parse line {}: {e}", line_num + 1))
            })?;

            if let Some(name) = name {
                if report.meta.name != name {
                    continue;
                }
            }

            reports.push(report);
        }

        Ok(reports)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompilerInfo;
    use crate::{CommonMeta, SizeReport};

    fn make_report(name: &str, constraints: u64) -> SizeReport {
        SizeReport {
            schema_version: SCHEMA_VERSION,
            meta: CommonMeta {
                name: name.to_string(),
                timestamp: crate::now_string(),
                compiler_version: "2.1.9".into(),
                circuit_path: "bench.circom".into(),
                cli_args: vec![],
                circuit_sha256: None,
            },
            prime: "bn128".into(),
            optimization_level: 2,
            constraint_count: constraints,
            var_count: constraints + 1,
            pub_output_count: 1,
            pub_input_count: 0,
            prv_input_count: 0,
            label_count: 0,
            compile_time_ms: 10,
            peak_memory_bytes: None,
            compiler: CompilerInfo {
                name: "mock".into(),
                version: None,
            },
            system: None,
        }
    }

    #[test]
    fn test_append_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonlWriter::new(dir.path().join("sizes.jsonl"));

        writer.append(&make_report("a", 10)).unwrap();
        writer.append(&make_report("b", 20)).unwrap();

        let all = writer.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].constraint_count, 20);

        let filtered = writer.read_filtered(Some("a")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].meta.name, "a");
    }

    #[test]
    fn test_schema_version_validation() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonlWriter::new(dir.path().join("sizes.jsonl"));

        let mut report = make_report("x", 1);
        report.schema_version = 999;

        let result = writer.append(&report);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("schema version mismatch")
        );
    }
}
