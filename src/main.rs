use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use repomap::{generate_all_artifacts, verify_determinism, RepomapError};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "repomap",
    version = "0.1.0",
    author = "repomap developers",
    about = "Deterministic static analysis of Python codebases"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Analyze a project and write all artifacts
    Generate {
        /// Project root
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// Output directory (defaults to `output_dir` from repomap.toml)
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Regenerate artifacts and compare them with an existing set
    Verify {
        /// Project root
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// Directory holding previously generated artifacts
        #[arg(short, long, value_name = "DIR")]
        artifacts_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            match err.downcast_ref::<RepomapError>() {
                Some(RepomapError::MissingArtifacts(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let start_time = Instant::now();

    match cli.command {
        Command::Generate { root, out_dir } => {
            let summary = generate_all_artifacts(&root, out_dir.as_deref())
                .with_context(|| format!("failed to generate artifacts for {}", root.display()))?;

            println!(
                "{} modules, {} symbols, {} calls, {} refs",
                summary.modules, summary.symbols, summary.calls, summary.refs
            );
            println!(
                "{} nodes, {} edges, {} cycles, {} integrations",
                summary.nodes, summary.edges, summary.cycles, summary.integrations
            );
            for path in &summary.written {
                println!("wrote {}", path.display());
            }
            println!("Total execution time: {:.2}s", start_time.elapsed().as_secs_f64());
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            root,
            artifacts_dir,
        } => {
            let artifacts_dir = match artifacts_dir {
                Some(dir) => dir,
                None => repomap::config::RepomapConfig::load(&root)?.resolve_output_dir(&root)?,
            };
            let report = verify_determinism(&root, &artifacts_dir)?;

            for name in &report.missing {
                println!("missing: {}", name);
            }
            for name in &report.extra {
                println!("extra: {}", name);
            }
            for name in &report.mismatched {
                println!("mismatch: {}", name);
            }

            if report.is_deterministic() {
                println!("Artifacts in {} are deterministic.", artifacts_dir.display());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("Artifacts in {} differ from a fresh run.", artifacts_dir.display());
                Ok(ExitCode::from(1))
            }
        }
    }
}
