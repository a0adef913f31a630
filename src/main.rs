//! menu-detector - Menu screen detection for game captures
//!
//! Reads screenshots written by an external capture process, runs OCR on
//! them and reports whether the frame shows a menu rather than gameplay.

mod analysis;
mod api;
mod capture;
mod config;
mod error;
mod vision;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::analysis::MenuDetector;
use crate::config::AppConfig;
use crate::vision::TesseractCli;

/// menu-detector - Menu screen detection for game captures
#[derive(Parser, Debug)]
#[command(name = "menu-detector")]
#[command(about = "Decide whether a captured game frame is a menu screen")]
struct Args {
    /// Configuration file (defaults to the per-user config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Captures directory, overriding the configuration
    #[arg(long, global = true)]
    captures_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyze one capture and print the verdict as JSON
    Analyze {
        /// File name relative to the captures directory
        filename: String,
        /// Keyword pattern replacing the defaults (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
    },
    /// Analyze the newest capture and print the verdict as JSON
    Latest,
    /// Print the effective configuration
    Config {
        /// Also write it to the per-user config.toml
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = config::load_or_default(args.config.as_deref())?;
    if let Some(dir) = args.captures_dir {
        config.captures.dir = dir;
    }
    config.validate()?;

    match args.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => run_server(config, host, port),
        Command::Analyze { filename, keywords } => {
            let detector = build_detector(config)?;
            let verdict = detector.analyze_named(&filename, Some(keywords.as_slice()))?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Command::Latest => {
            let detector = build_detector(config)?;
            let verdict = detector.analyze_latest()?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Command::Config { save } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if save {
                let path = config::config_dir()?.join("config.toml");
                config::save_config(&config, &path)?;
                info!("Saved configuration to {:?}", path);
            }
            Ok(())
        }
    }
}

fn build_detector(config: AppConfig) -> Result<MenuDetector> {
    let engine = TesseractCli::from_config(&config.ocr);
    Ok(MenuDetector::new(config, Arc::new(engine))?)
}

/// Run the HTTP API until interrupted
fn run_server(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let engine = TesseractCli::from_config(&config.ocr);
    if let Err(e) = engine.probe() {
        warn!("OCR engine not usable yet, analysis requests will fail: {}", e);
    }

    info!("menu-detector starting, captures directory {:?}", config.captures.dir);
    let detector = Arc::new(MenuDetector::new(config, Arc::new(engine))?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::serve(detector, &host, port))?;

    info!("menu-detector shutdown complete");
    Ok(())
}
