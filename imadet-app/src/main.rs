mod app;
mod observer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imadet_core::ResponseMapping;
use imadet_experiment::ExperimentConfig;

use app::App;
use observer::ObserverProfile;

#[derive(Parser)]
#[command(name = "imadet")]
#[command(about = "Grating detection practice, staircase calibration and main-experiment planning")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full session against a simulated participant.
    Simulate {
        /// Experiment configuration (JSON); missing fields use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Simulated participant profile (JSON).
        #[arg(long)]
        observer: Option<PathBuf>,

        /// Seed for trial order and participant responses.
        #[arg(long)]
        seed: Option<u64>,

        /// Key meaning "grating present".
        #[arg(long, default_value = "f")]
        present_key: char,

        /// Key meaning "grating absent".
        #[arg(long, default_value = "j")]
        absent_key: char,

        /// Stop after calibration.
        #[arg(long)]
        skip_main: bool,

        /// Write the session summary here instead of stdout (JSON).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Validate a configuration file and print it with defaults filled in.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            observer,
            seed,
            present_key,
            absent_key,
            skip_main,
            out,
        } => {
            let config = load_config(config.as_deref())?;
            let profile: ObserverProfile = match observer {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => ObserverProfile::default(),
            };
            profile.validate().context("invalid observer profile")?;
            if present_key.eq_ignore_ascii_case(&absent_key) {
                anyhow::bail!("present and absent keys must differ");
            }
            let seed = seed.unwrap_or_else(rand::random);
            let mapping = ResponseMapping::new(present_key, absent_key);

            let summary = App::new(config, mapping, profile, seed, skip_main)?.run()?;
            let json = serde_json::to_string_pretty(&summary)?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Commands::CheckConfig { config } => {
            let config = load_config(Some(&config))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    let Some(path) = path else {
        return Ok(ExperimentConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ExperimentConfig::from_json_str(&text).with_context(|| format!("loading {}", path.display()))
}
