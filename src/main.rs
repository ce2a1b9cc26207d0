use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use act::{Config, Tester};

#[derive(Debug, Parser)]
#[command(name = "act", version, about = "Act is a tool for AtCoder.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile a task if its source changed and run it against one sample
    Test {
        /// Task id, e.g. "a" for a.cc
        task_id: String,
        /// Sample id, e.g. "1" or "01"
        sample_id: String,
        /// Directory holding the sources, sample/ and cache/
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Kill the program after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("act=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Test {
            task_id,
            sample_id,
            root,
            timeout,
            json,
        } => {
            let mut config = Config::load(&root)
                .with_context(|| format!("Failed to load configuration from {}", root.display()))?;
            if let Some(secs) = timeout {
                config.run_timeout = Some(Duration::from_secs(secs));
            }
            info!("Testing task={} sample={}", task_id, sample_id);

            let tester = Tester::from_config(config);
            let report = tester
                .run_test(&task_id, &sample_id)
                .await
                .with_context(|| format!("Test failed for task {}", task_id))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
    }

    Ok(())
}
