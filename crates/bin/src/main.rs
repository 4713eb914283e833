//! Ledgerlens CLI binary.
//!
//! Cross-verifies the tables of SEC filings against their XBRL facts.

mod integration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::{artifacts, filings};
use ledgerlens::output::RunSummary;
use ledgerlens::verify::VerificationOutcome;
use ledgerlens::{FilingInput, FilingRun, Pipeline, Settings};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledgerlens")]
#[command(about = "Cross-verify SEC filing tables against XBRL facts", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./.ledgerlens.toml, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map and verify one filing directory
    Run {
        /// Filing directory (xbrl.xml, xbrl.json or facts.csv, plus values.csv and/or tables/)
        filing: PathBuf,

        /// Write reports and exports into this directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Only compare against facts for the period ending on this date
        #[arg(long)]
        period_end: Option<NaiveDate>,

        /// Print the full report as JSON instead of the summary table
        #[arg(long)]
        json: bool,
    },

    /// Map and verify many filings in parallel
    Batch {
        /// Filing directories, or directories containing them
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Write each filing's reports into a subdirectory of this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Map concepts to table labels without verifying
    Map {
        /// Filing directory
        filing: PathBuf,

        /// Write the mapping report and CSV into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the synonym table in use
    Synonyms,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (mut settings, origin) =
        Settings::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = &origin {
        tracing::info!(path = %path.display(), "using config");
    }

    match cli.command {
        Commands::Run {
            filing,
            out,
            period_end,
            json,
        } => {
            if period_end.is_some() {
                settings.verifier.target_period_end = period_end;
            }
            run_filing(&settings, &filing, out.as_deref(), json)
        }
        Commands::Batch { dirs, out } => run_batch(&settings, &dirs, out.as_deref()),
        Commands::Map { filing, out } => map_filing(&settings, &filing, out.as_deref()),
        Commands::Synonyms => show_synonyms(&settings),
    }
}

fn load_filing(filing: &Path) -> Result<FilingInput> {
    FilingInput::from_dir(filing).with_context(|| format!("loading filing {}", filing.display()))
}

fn run_filing(settings: &Settings, filing: &Path, out: Option<&Path>, json: bool) -> Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let input = load_filing(filing)?;
    let run = pipeline.run(&input);

    if json {
        let report = pipeline.report(run.clone())?;
        println!("{}", report.to_json()?);
    } else {
        print!("{}", run.summary.to_ascii_table());
        for diagnostic in &run.verification.diagnostics {
            println!("  ! {diagnostic}");
        }
    }

    if let Some(out) = out {
        artifacts::write_run(&pipeline, run, out)?;
        println!("Reports written to {}", out.display());
    }
    Ok(())
}

fn run_batch(settings: &Settings, dirs: &[PathBuf], out: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let filings = filings::discover(dirs).context("scanning filing directories")?;
    if filings.is_empty() {
        bail!("no filing directories found");
    }

    let pb = ProgressBar::new(filings.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.set_message("Verifying filings...");

    let results = pipeline.run_dirs(&filings, |dir, result| {
        if let Err(e) = result {
            pb.println(format!("  failed: {}: {e}", dir.display()));
        }
        pb.inc(1);
    });

    let mut failed = results.iter().filter(|r| r.is_err()).count();
    pb.finish_with_message(format!(
        "Verified {} filing(s), {} failed",
        results.len() - failed,
        failed
    ));

    println!(
        "\n{:<40} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Filing", "Mapped", "Exact", "Close", "Mismatch", "Accuracy"
    );
    println!("{}", "-".repeat(88));
    let mut runs = Vec::new();
    for (dir, result) in filings.iter().zip(results) {
        let Ok(run) = result else {
            continue;
        };
        let s = &run.summary;
        println!(
            "{:<40} {:>8} {:>8} {:>8} {:>8} {:>10}",
            run.name,
            format!("{}/{}", s.mapped, s.total_concepts),
            s.exact,
            s.close,
            s.mismatch,
            s.mean_accuracy
                .map_or_else(|| "n/a".to_string(), |a| format!("{a:.2}%"))
        );
        runs.push((filings::output_name(dir), run));
    }

    if let Some(out) = out {
        failed += artifacts::write_batch(&pipeline, runs, out);
    }

    if failed == filings.len() {
        bail!("every filing failed");
    }
    Ok(())
}

fn map_filing(settings: &Settings, filing: &Path, out: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let input = load_filing(filing)?;
    let mappings = pipeline.map(&input);
    let verification = VerificationOutcome::default();
    let run = FilingRun {
        summary: RunSummary::from_run(&input.name, &mappings, &verification),
        name: input.name,
        mappings,
        verification,
    };

    match out {
        Some(out) => {
            artifacts::write_mappings(&pipeline, run, out)?;
            println!("Mapping report written to {}", out.display());
        }
        None => print!("{}", pipeline.report(run)?.mapping_report()),
    }
    Ok(())
}

fn show_synonyms(settings: &Settings) -> Result<()> {
    let table = settings.synonym_table()?;
    let source = settings
        .synonyms
        .path
        .as_ref()
        .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());

    println!("Synonym table v{} ({source})", table.version());
    println!("Keyword groups: {}", table.group_names().join(", "));
    println!("{}", "=".repeat(80));
    for concept in table.concepts() {
        println!("{}", concept.name);
        if !concept.elements.is_empty() {
            println!("  elements: {}", concept.elements.join(", "));
        }
        println!("  synonyms: {}", concept.synonyms.join(", "));
    }
    Ok(())
}
