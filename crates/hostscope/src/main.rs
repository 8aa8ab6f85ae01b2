//! hostscope
//!
//! Collects a point-in-time inventory of the local host, evaluates rules over
//! it and writes JSON/HTML reports.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use hostscope_api::Severity;
use hostscope_export::Format;
use tracing_subscriber::EnvFilter;

mod config;
mod factory;
mod run;

use config::{Config, LoggingConfig};
use run::RunOptions;

#[derive(Parser)]
#[command(name = "hostscope")]
#[command(version, about = "Host inventory and hardening snapshot", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the standard search path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every enabled area and write reports
    Run {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report formats (json, html)
        #[arg(short, long, value_delimiter = ',')]
        format: Vec<Format>,

        /// Stop collecting after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List analyzer modules
    Modules,

    /// Write a default configuration file
    #[command(name = "init-config")]
    InitConfig {
        #[arg(default_value = "hostscope.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Run {
            output,
            format,
            timeout,
        } => {
            let options = RunOptions {
                output,
                formats: format,
                timeout: timeout.map(Duration::from_secs),
            };
            let summary = run::execute(&config, options).await?;
            let result = &summary.result;

            println!(
                "{}: {} areas, {} critical, {} warnings",
                result.computer_name,
                result.areas.len(),
                result.count_severity(Severity::Critical),
                result.count_severity(Severity::Warning),
            );
            for area in &result.areas {
                println!("  {:<10} {}", area.area, area.outcome);
            }
            for path in &summary.reports {
                println!("wrote {}", path.display());
            }
        }
        Commands::Modules => {
            for module in factory::modules(&Config::default()) {
                let state = if config.run.is_disabled(module.area()) {
                    "disabled"
                } else {
                    "enabled"
                };
                println!("{:<10} {:<24} {state}", module.area(), module.name());
            }
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                eyre::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, Config::template()?)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}
