use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use layergen::{check_artifacts, generate_from_paths, lint_paths, write_artifacts};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate sources from the settings and schema documents
    Generate {
        /// Document or directory to read; may be repeated
        #[arg(long, short, env = "LAYERGEN_INPUT", default_value = ".")]
        input: Vec<PathBuf>,
        /// Directory the backend/ and frontend/ trees are written to
        #[arg(long, default_value = "generated")]
        out: PathBuf,
    },
    /// Fail if the generated sources on disk are missing or out of date
    Check {
        #[arg(long, short, env = "LAYERGEN_INPUT", default_value = ".")]
        input: Vec<PathBuf>,
        #[arg(long, default_value = "generated")]
        out: PathBuf,
    },
    /// Lint the schema for common errors
    Lint {
        #[arg(long, short, env = "LAYERGEN_INPUT", default_value = ".")]
        input: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { input, out } => {
            let artifacts = generate_from_paths(&input).context("generation failed")?;
            write_artifacts(&artifacts, &out)?;
            println!("Generated {} files into {}", artifacts.len(), out.display());
        }
        Commands::Check { input, out } => {
            let artifacts = generate_from_paths(&input).context("generation failed")?;
            let stale = check_artifacts(&artifacts, &out)?;
            if stale.is_empty() {
                println!("Generated sources are up to date");
            } else {
                for path in &stale {
                    eprintln!("stale: {}", path.display());
                }
                anyhow::bail!("{} generated files are out of date", stale.len());
            }
        }
        Commands::Lint { input } => {
            let errors = lint_paths(&input).context("failed to load documents")?;
            if errors.is_empty() {
                println!("Schema lint passed");
            } else {
                for e in &errors {
                    eprintln!("{}", e);
                }
                anyhow::bail!("Schema lint failed");
            }
        }
    }
    Ok(())
}
