#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use circom_bench::{compare_cmd, size_cmd, suite_cmd};

#[derive(Parser, Debug)]
#[command(name = "circom-bench")]
#[command(about = "Constraint-system size benchmarks for circom circuits", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set CIRCOM_BENCH_LOG)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile one circuit and report its constraint-system size
    Size {
        /// Path to the circuit source (.circom)
        #[arg(long)]
        circuit: std::path::PathBuf,
        /// Benchmark name (defaults to the circuit file stem)
        #[arg(long)]
        name: Option<String>,
        /// Prime field identifier passed to the compiler (e.g. bn128)
        #[arg(long, default_value = "bn128")]
        prime: String,
        /// Optimization level (0, 1 or 2)
        #[arg(long = "opt-level", short = 'O', default_value_t = 2)]
        opt_level: u8,
        /// Path to circomlib (falls back to CIRCOMLIB_PATH)
        #[arg(long)]
        circomlib: Option<std::path::PathBuf>,
        /// The circuit does not depend on circomlib
        #[arg(long)]
        no_circomlib: bool,
        /// Additional include directories, searched before circomlib
        #[arg(long = "include", short = 'l')]
        include: Vec<std::path::PathBuf>,
        /// Path to the circom binary
        #[arg(long)]
        compiler_path: Option<std::path::PathBuf>,
        /// Generic compiler command template (placeholders: {circuit},{outdir},{prime},{O})
        #[arg(long)]
        template: Option<String>,
        /// Additional args passed to the compiler
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        compiler_args: Vec<String>,
        /// Wall-clock budget in seconds (0 = unlimited)
        #[arg(long, default_value_t = 100)]
        timeout: u64,
        /// Write machine-readable JSON report to this file
        #[arg(long)]
        json: Option<std::path::PathBuf>,
    },

    /// Run a suite of size benchmarks sequentially
    Suite {
        /// Path to the suite config (YAML)
        #[arg(long)]
        config: std::path::PathBuf,
        /// Path to circomlib (overrides the config and CIRCOMLIB_PATH)
        #[arg(long)]
        circomlib: Option<std::path::PathBuf>,
        /// Append one JSON report per line to this file
        #[arg(long)]
        jsonl: Option<std::path::PathBuf>,
        /// Export all reports as CSV to this file
        #[arg(long)]
        csv: Option<std::path::PathBuf>,
        /// Write a pretty JSON summary to this file
        #[arg(long)]
        summary: Option<std::path::PathBuf>,
    },

    /// Compare two size reports for regressions
    Compare {
        /// Baseline JSON report
        #[arg(long)]
        baseline: Option<std::path::PathBuf>,
        /// Target JSON report
        #[arg(long)]
        target: Option<std::path::PathBuf>,
        /// Baseline JSONL file (multiple reports, matched by name)
        #[arg(long)]
        baseline_file: Option<std::path::PathBuf>,
        /// Target JSONL file
        #[arg(long)]
        target_file: Option<std::path::PathBuf>,
        /// Regression threshold percentage for timing metrics
        #[arg(long, default_value_t = compare_cmd::DEFAULT_THRESHOLD)]
        threshold: f64,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
        /// Write machine-readable JSON comparison to this file
        #[arg(long)]
        json: Option<std::path::PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("CIRCOM_BENCH_LOG").unwrap_or_else(|_| {
        if verbose {
            "circom_bench=debug".to_string()
        } else {
            "circom_bench=info".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Size {
            circuit,
            name,
            prime,
            opt_level,
            circomlib,
            no_circomlib,
            include,
            compiler_path,
            template,
            compiler_args,
            timeout,
            json,
        } => size_cmd::run(
            circuit,
            name,
            prime,
            opt_level,
            circomlib,
            no_circomlib,
            include,
            compiler_path,
            template,
            compiler_args,
            timeout,
            json,
        )
        .map(|_| 0),
        Commands::Suite {
            config,
            circomlib,
            jsonl,
            csv,
            summary,
        } => suite_cmd::run(config, circomlib, jsonl, csv, summary).map(|_| 0),
        Commands::Compare {
            baseline,
            target,
            baseline_file,
            target_file,
            threshold,
            format,
            json,
        } => compare_cmd::run(
            baseline,
            target,
            baseline_file,
            target_file,
            threshold,
            format,
            json,
        )
        .map(|r| r.ci_exit_code),
    };

    match result {
        Ok(code) if code != 0 => std::process::exit(code),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}
