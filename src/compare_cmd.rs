//! Compare size reports for regression detection.
//!
//! Supports comparing single JSON reports or JSONL files containing
//! multiple reports matched by benchmark name. Constraint and variable
//! counts are compared exactly: raising the optimization level must never
//! increase the constraint count, so any growth is a regression regardless
//! of the percentage threshold. Compile time uses the threshold.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BenchError, BenchResult, JsonlWriter};

/// Default regression threshold percentage for timing metrics
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// Comparison of a single metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub baseline: f64,
    pub target: f64,
    pub delta: f64,
    pub percent: f64,
    pub status: CompareStatus,
}

/// Status of a metric comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareStatus {
    Regression,
    Improvement,
    Unchanged,
}

/// Comparison results for a single benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchComparison {
    pub name: String,
    pub metrics: Vec<MetricComparison>,
    pub has_regression: bool,
}

/// Full comparison result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResult {
    pub baseline_ref: String,
    pub target_ref: String,
    pub threshold: f64,
    pub benchmarks: Vec<BenchComparison>,
    pub total_regressions: usize,
    pub total_improvements: usize,
    pub ci_exit_code: i32,
}

/// How a metric's delta is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Judgement {
    /// Any increase is a regression, any decrease an improvement
    Exact,
    /// Increase/decrease beyond the percentage threshold
    Threshold,
}

const METRIC_DEFS: &[(&str, &str, Judgement)] = &[
    ("constraint_count", "constraints", Judgement::Exact),
    ("var_count", "vars", Judgement::Exact),
    ("compile_time_ms", "compile_ms", Judgement::Threshold),
    ("peak_memory_bytes", "peak_mem", Judgement::Threshold),
];

fn get_num(v: &Value, key: &str) -> Option<f64> {
    v.get(key)
        .and_then(|x| x.as_f64().or_else(|| x.as_u64().map(|u| u as f64)))
}

fn get_name(v: &Value) -> Option<String> {
    v.get("name")
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
        .or_else(|| {
            v.get("circuit_path").and_then(|x| x.as_str()).map(|s| {
                std::path::Path::new(s)
                    .file_stem()
                    .and_then(|os| os.to_str())
                    .unwrap_or("unknown")
                    .to_string()
            })
        })
}

fn compare_values(baseline: &Value, target: &Value, threshold: f64) -> Vec<MetricComparison> {
    let mut results = Vec::new();

    for (key, display_name, judgement) in METRIC_DEFS {
        if let (Some(bv), Some(tv)) = (get_num(baseline, key), get_num(target, key)) {
            let delta = tv - bv;
            let percent = if bv != 0.0 { delta * 100.0 / bv } else { 0.0 };

            let status = match judgement {
                Judgement::Exact => {
                    if delta > 0.0 {
                        CompareStatus::Regression
                    } else if delta < 0.0 {
                        CompareStatus::Improvement
                    } else {
                        CompareStatus::Unchanged
                    }
                }
                Judgement::Threshold => {
                    if percent > threshold {
                        CompareStatus::Regression
                    } else if percent < -threshold {
                        CompareStatus::Improvement
                    } else {
                        CompareStatus::Unchanged
                    }
                }
            };

            results.push(MetricComparison {
                metric: display_name.to_string(),
                baseline: bv,
                target: tv,
                delta,
                percent,
                status,
            });
        }
    }

    results
}

fn compare_single_reports(baseline: &Value, target: &Value, threshold: f64) -> BenchComparison {
    let name = get_name(baseline)
        .or_else(|| get_name(target))
        .unwrap_or_else(|| "unknown".to_string());

    let metrics = compare_values(baseline, target, threshold);
    let has_regression = metrics
        .iter()
        .any(|m| m.status == CompareStatus::Regression);

    BenchComparison {
        name,
        metrics,
        has_regression,
    }
}

/// Compare JSONL files by matching reports with the same benchmark name
fn compare_jsonl_files(
    baseline_path: &PathBuf,
    target_path: &PathBuf,
    threshold: f64,
) -> BenchResult<Vec<BenchComparison>> {
    let baseline_reports = JsonlWriter::new(baseline_path).read_all()?;
    let target_reports = JsonlWriter::new(target_path).read_all()?;

    let mut baseline_map: HashMap<String, Value> = HashMap::new();
    for report in baseline_reports {
        let json = serde_json::to_value(&report)
            .map_err(|e| BenchError::Message(format!("failed to serialize report: {e}")))?;
        baseline_map.insert(report.meta.name.clone(), json);
    }

    let mut comparisons = Vec::new();
    for report in target_reports {
        let target_json = serde_json::to_value(&report)
            .map_err(|e| BenchError::Message(format!("failed to serialize report: {e}")))?;

        if let Some(baseline_json) = baseline_map.get(&report.meta.name) {
            comparisons.push(compare_single_reports(baseline_json, &target_json, threshold));
        } else {
            // New benchmark in target, no baseline to compare
            comparisons.push(BenchComparison {
                name: report.meta.name,
                metrics: Vec::new(),
                has_regression: false,
            });
        }
    }

    Ok(comparisons)
}

fn compare_json_files(
    baseline_path: &PathBuf,
    target_path: &PathBuf,
    threshold: f64,
) -> BenchResult<Vec<BenchComparison>> {
    let b = std::fs::read(baseline_path).map_err(|e| BenchError::Message(e.to_string()))?;
    let t = std::fs::read(target_path).map_err(|e| BenchError::Message(e.to_string()))?;
    let baseline: Value =
        serde_json::from_slice(&b).map_err(|e| BenchError::Message(e.to_string()))?;
    let target: Value =
        serde_json::from_slice(&t).map_err(|e| BenchError::Message(e.to_string()))?;

    Ok(vec![compare_single_reports(&baseline, &target, threshold)])
}

fn format_value(value: f64, metric: &str) -> String {
    if metric.contains("mem") {
        if value >= 1_000_000_000.0 {
            format!("{:.1} GB", value / 1_000_000_000.0)
        } else if value >= 1_000_000.0 {
            format!("{:.1} MB", value / 1_000_000.0)
        } else {
            format!("{:.0} B", value)
        }
    } else if metric.contains("ms") {
        if value >= 1000.0 {
            format!("{:.2}s", value / 1000.0)
        } else {
            format!("{:.0}ms", value)
        }
    } else {
        format!("{:.0}", value)
    }
}

fn format_text(result: &CompareResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Comparing: {} vs {} (threshold: {:.1}%)\n\n",
        result.baseline_ref, result.target_ref, result.threshold
    ));

    for bench in &result.benchmarks {
        out.push_str(&format!("Benchmark: {}\n", bench.name));
        for m in &bench.metrics {
            let status_str = match m.status {
                CompareStatus::Regression => "[REGRESS]",
                CompareStatus::Improvement => "[IMPROVE]",
                CompareStatus::Unchanged => "[OK]",
            };
            out.push_str(&format!(
                "  {}: {} -> {} ({:+.2}%) {}\n",
                m.metric,
                format_value(m.baseline, &m.metric),
                format_value(m.target, &m.metric),
                m.percent,
                status_str
            ));
        }
        out.push('\n');
    }

    if result.total_regressions > 0 {
        out.push_str(&format!(
            "Result: {} regression(s) detected\n",
            result.total_regressions
        ));
    } else {
        out.push_str("Result: No regressions detected\n");
    }

    out
}

/// Configuration for the compare command
pub struct CompareConfig {
    pub baseline_file: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub baseline_json: Option<PathBuf>,
    pub target_json: Option<PathBuf>,
    pub threshold: f64,
}

/// Run comparison and return result
pub fn compare(config: &CompareConfig) -> BenchResult<CompareResult> {
    let (benchmarks, baseline_ref, target_ref) = if let (Some(baseline), Some(target)) =
        (&config.baseline_file, &config.target_file)
    {
        let benchmarks = compare_jsonl_files(baseline, target, config.threshold)?;
        (benchmarks, file_ref(baseline), file_ref(target))
    } else if let (Some(baseline), Some(target)) = (&config.baseline_json, &config.target_json) {
        let benchmarks = compare_json_files(baseline, target, config.threshold)?;
        (benchmarks, file_ref(baseline), file_ref(target))
    } else {
        return Err(BenchError::Configuration(
            "must provide either --baseline-file/--target-file or --baseline/--target".into(),
        ));
    };

    let total_regressions = benchmarks
        .iter()
        .flat_map(|b| &b.metrics)
        .filter(|m| m.status == CompareStatus::Regression)
        .count();

    let total_improvements = benchmarks
        .iter()
        .flat_map(|b| &b.metrics)
        .filter(|m| m.status == CompareStatus::Improvement)
        .count();

    let ci_exit_code = if total_regressions > 0 { 1 } else { 0 };

    Ok(CompareResult {
        baseline_ref,
        target_ref,
        threshold: config.threshold,
        benchmarks,
        total_regressions,
        total_improvements,
        ci_exit_code,
    })
}

fn file_ref(path: &PathBuf) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("report")
        .to_string()
}

/// Main entry point for the compare command
pub fn run(
    baseline: Option<PathBuf>,
    target: Option<PathBuf>,
    baseline_file: Option<PathBuf>,
    target_file: Option<PathBuf>,
    threshold: f64,
    format: String,
    json_out: Option<PathBuf>,
) -> BenchResult<CompareResult> {
    let config = CompareConfig {
        baseline_file,
        target_file,
        baseline_json: baseline,
        target_json: target,
        threshold,
    };

    let result = compare(&config)?;

    if let Some(json_path) = &json_out {
        crate::write_json(json_path, &result)?;
        eprintln!("Wrote comparison to {}", json_path.display());
    }

    let output = match format.as_str() {
        "json" => serde_json::to_string_pretty(&result).unwrap_or_else(|_| "{}".to_string()),
        _ => format_text(&result),
    };
    print!("{}", output);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_increase_is_regression_regardless_of_threshold() {
        // O1 baseline vs O2 target: raising the optimization level must
        // never increase the constraint count, even by a fraction.
        let baseline = serde_json::json!({
            "name": "sha256_compression",
            "constraint_count": 26060,
            "var_count": 26573
        });
        let target = serde_json::json!({
            "name": "sha256_compression",
            "constraint_count": 26061,
            "var_count": 26573
        });

        let results = compare_values(&baseline, &target, 50.0);
        let constraints = results.iter().find(|m| m.metric == "constraints").unwrap();
        assert_eq!(constraints.status, CompareStatus::Regression);

        let vars = results.iter().find(|m| m.metric == "vars").unwrap();
        assert_eq!(vars.status, CompareStatus::Unchanged);
    }

    #[test]
    fn test_constraint_decrease_is_improvement() {
        let baseline = serde_json::json!({ "constraint_count": 30000 });
        let target = serde_json::json!({ "constraint_count": 26060 });

        let results = compare_values(&baseline, &target, 10.0);
        assert_eq!(results[0].status, CompareStatus::Improvement);
    }

    #[test]
    fn test_compile_time_uses_threshold() {
        let baseline = serde_json::json!({ "compile_time_ms": 100.0 });
        let target = serde_json::json!({ "compile_time_ms": 105.0 });

        let results = compare_values(&baseline, &target, 10.0);
        let compile = results.iter().find(|m| m.metric == "compile_ms").unwrap();
        assert_eq!(compile.status, CompareStatus::Unchanged);

        let target = serde_json::json!({ "compile_time_ms": 120.0 });
        let results = compare_values(&baseline, &target, 10.0);
        let compile = results.iter().find(|m| m.metric == "compile_ms").unwrap();
        assert_eq!(compile.status, CompareStatus::Regression);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(100.0, "compile_ms"), "100ms");
        assert_eq!(format_value(1500.0, "compile_ms"), "1.50s");
        assert_eq!(format_value(26060.0, "constraints"), "26060");
        assert_eq!(format_value(1048576.0, "peak_mem"), "1.0 MB");
    }

    #[test]
    fn test_missing_inputs_is_configuration_error() {
        let config = CompareConfig {
            baseline_file: None,
            target_file: None,
            baseline_json: None,
            target_json: None,
            threshold: DEFAULT_THRESHOLD,
        };
        let err = compare(&config).unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)));
    }
}
