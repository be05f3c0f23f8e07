//! mapweave - merge, analyze and track lineage of multi-release mappings

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mapping_cli::{commands, RunOptions};
use mapping_pipeline::PipelineSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mapweave")]
#[command(about = "Merge per-release mappings and compute cross-release lineage", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file path
    #[arg(short, long, env = "MAPWEAVE_CONFIG", default_value = "mapweave.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write trees plus lineage index
    Run {
        /// Directory holding manifest.json and per-release fragments
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Persist provider responses under this directory
        #[arg(long, env = "MAPWEAVE_CACHE")]
        cache: Option<PathBuf>,

        /// Report analysis repairs without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// List the releases the settings select
    Releases {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let settings = PipelineSettings::load(&cli.config)?;

    match cli.command {
        Commands::Run {
            input,
            out,
            cache,
            dry_run,
        } => {
            let options = RunOptions {
                input,
                out,
                cache,
                dry_run,
            };
            let output = commands::run(settings, &options).await?;
            println!(
                "Wrote {} releases to {} ({} skipped)",
                output.trees.len(),
                options.out.display(),
                output.failures.len()
            );
            Ok(())
        }
        Commands::Releases { input } => {
            commands::releases(&settings, &input)?;
            Ok(())
        }
        Commands::Config => {
            println!("Config: {}", cli.config.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
