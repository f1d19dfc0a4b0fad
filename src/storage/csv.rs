//! CSV export for size reports.

use std::io::Write;
use std::path::Path;

use crate::{BenchError, SizeReport};

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "schema_version",
    "timestamp",
    "name",
    "circuit_path",
    "circuit_sha256",
    "compiler_name",
    "compiler_version",
    "prime",
    "optimization_level",
    "constraint_count",
    "var_count",
    "pub_output_count",
    "pub_input_count",
    "prv_input_count",
    "label_count",
    "compile_time_ms",
    "peak_memory_bytes",
];

/// CSV exporter for size reports.
///
/// Exports with a flat column structure and deterministic column order for
/// easy comparison and analysis.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export reports to a CSV file.
    pub fn export(&self, reports: &[SizeReport], output: &Path) -> Result<(), BenchError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| BenchError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(reports, file)
    }

    /// Export reports to any writer implementing Write.
    pub fn export_to_writer<W: Write>(
        &self,
        reports: &[SizeReport],
        writer: W,
    ) -> Result<(), BenchError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| BenchError::Message(format!("failed to write CSV headers: {e}")))?;

        for report in reports {
            let row = self.report_to_row(report);
            csv_writer
                .write_record(&row)
                .map_err(|e| BenchError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| BenchError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    fn report_to_row(&self, report: &SizeReport) -> Vec<String> {
        vec![
            report.schema_version.to_string(),
            report.meta.timestamp.clone(),
            report.meta.name.clone(),
            report.meta.circuit_path.display().to_string(),
            report.meta.circuit_sha256.clone().unwrap_or_default(),
            report.compiler.name.clone(),
            report.compiler.version.clone().unwrap_or_default(),
            report.prime.clone(),
            report.optimization_level.to_string(),
            report.constraint_count.to_string(),
            report.var_count.to_string(),
            report.pub_output_count.to_string(),
            report.pub_input_count.to_string(),
            report.prv_input_count.to_string(),
            report.label_count.to_string(),
            report.compile_time_ms.to_string(),
            report
                .peak_memory_bytes
                .map(|v| v.to_string())
                .unwrap_or_default(),
        ]
    }
}
