//! threat-scan: evaluate threat rules against a diagram, or validate a rule set.
//!
//! Configuration comes from the environment (optionally a `.env` file, with
//! `THREATLENS_PROFILE` selecting `{PROFILE}_{KEY}` overrides); flags win.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use threatlens_core::{config, Config, Diagram, Severity};
use threatlens_rules::loader::{LoadStatus, RuleLoader};
use threatlens_rules::report::ScanReport;
use threatlens_rules::scanner::Scanner;
use threatlens_rules::validation::validate_document;

// ── CLI ─────────────────────────────────────────────────────────────

/// Rule-based threat modeling over an element diagram.
#[derive(Parser, Debug)]
#[command(name = "threat-scan", version, about)]
struct Cli {
    /// Directory containing rule and threat YAML documents.
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,

    /// Maximum predicate-list nesting before a subtree evaluates to false.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load rules and a diagram, run every enabled rule and print a report.
    Scan {
        /// Diagram JSON file.
        #[arg(long)]
        diagram: Option<PathBuf>,

        /// Worker threads; 0 scans sequentially.
        #[arg(long)]
        threads: Option<usize>,

        #[arg(long, value_enum, env = "THREAT_SCAN_FORMAT", default_value = "table")]
        format: OutputFormat,

        /// Exit with status 1 when a finding at or above this severity exists.
        #[arg(long, env = "THREAT_SCAN_FAIL_ON")]
        fail_on: Option<Severity>,
    },
    /// Load and validate every rule and threat document.
    Validate {
        /// Treat warnings as failures.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Json,
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.rules_dir {
        config.scan.rules_dir = dir;
    }
    if let Some(depth) = cli.max_depth {
        config.scan.max_rule_depth = depth;
    }

    match cli.command {
        Command::Scan {
            diagram,
            threads,
            format,
            fail_on,
        } => {
            if let Some(path) = diagram {
                config.scan.diagram_path = path;
            }
            if let Some(threads) = threads {
                config.scan.threads = threads;
            }
            config.log_summary();
            scan(&config, format, fail_on)
        }
        Command::Validate { strict } => {
            config.log_summary();
            validate(&config, strict)
        }
    }
}

fn load_rules(config: &Config) -> Result<RuleLoader> {
    let mut loader = RuleLoader::new(config.scan.rules_dir.clone());
    let results = loader
        .load_all()
        .with_context(|| format!("failed to load {}", config.scan.rules_dir.display()))?;
    for result in &results {
        if let LoadStatus::Failed { error } = &result.status {
            warn!(path = %result.path.display(), error = %error, "skipping document");
        }
    }
    Ok(loader)
}

fn scan(config: &Config, format: OutputFormat, fail_on: Option<Severity>) -> Result<ExitCode> {
    let loader = load_rules(config)?;
    let rules = loader.rules();
    let threats = loader.threats();

    let diagram = Diagram::from_file(&config.scan.diagram_path)
        .with_context(|| format!("failed to load diagram {}", config.scan.diagram_path.display()))?;
    for problem in diagram.check_relations() {
        warn!(error = %problem, "diagram relation problem");
    }

    let scanner = Scanner::new(config.scan.max_rule_depth);
    let findings = if config.scan.threads == 0 {
        scanner.scan(&rules, &diagram, &threats)
    } else {
        scanner
            .scan_parallel(&rules, &diagram, &threats, config.scan.threads)
            .context("failed to build scan thread pool")?
    };

    let evaluated = rules.iter().filter(|r| r.is_enabled()).count();
    let report = ScanReport::build(&findings, &diagram, &threats, evaluated);
    match format {
        OutputFormat::Table => print!("{}", report.to_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(threshold) = fail_on {
        let failing = report.count_at_least(threshold);
        if failing > 0 {
            info!(threshold = %threshold, failing, "findings at or above threshold");
            return Ok(ExitCode::from(1));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn validate(config: &Config, strict: bool) -> Result<ExitCode> {
    let mut loader = RuleLoader::new(config.scan.rules_dir.clone());
    let results = loader
        .load_all()
        .with_context(|| format!("failed to load {}", config.scan.rules_dir.display()))?;
    let threats = loader.threats();

    let mut errors = 0;
    let mut warnings = 0;

    for result in &results {
        if let LoadStatus::Failed { error } = &result.status {
            errors += 1;
            println!("{}: error: {}", result.path.display(), error);
        }
    }

    for doc in loader.documents() {
        let id = &doc.metadata().id;
        let outcome = validate_document(doc, &threats, config.scan.max_rule_depth);
        for e in &outcome.errors {
            errors += 1;
            match &e.suggestion {
                Some(hint) => println!("{} [{}]: error: {} ({})", id, e.path, e.message, hint),
                None => println!("{} [{}]: error: {}", id, e.path, e.message),
            }
        }
        for w in &outcome.warnings {
            warnings += 1;
            println!("{} [{}]: warning: {}", id, w.path, w.message);
        }
    }

    println!(
        "{} document(s) checked: {} error(s), {} warning(s)",
        loader.documents().len(),
        errors,
        warnings
    );

    if errors > 0 || (strict && warnings > 0) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
