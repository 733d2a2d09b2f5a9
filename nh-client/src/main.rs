//! nh-client - Not Hamburger terminal client
//!
//! Runs one pass of the client flow against a relay: pick a file, compress
//! it, analyze it, print the verdict and optionally share it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nh_client::config::ClientOverrides;
use nh_client::desktop::{ConsoleShare, FilePicker};
use nh_client::jpeg::JpegManipulator;
use nh_client::platform::ImageSource;
use nh_client::{ClientConfig, FlowController, FlowState, ImageCompressor, RelayClient, Screen};
use nh_common::config::{config_file_path, load_toml_config};
use nh_common::logging;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "nh-client")]
#[command(about = "Ask the Not Hamburger relay whether a photo shows a hamburger")]
#[command(version)]
struct Args {
    /// Config file (default: $NH_CONFIG, then the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Relay base URL [env: NH_API_BASE_URL]
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// URL included in shared messages [env: NH_SHARE_URL]
    #[arg(long, global = true)]
    share_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one photo
    Analyze {
        /// Image file to analyze
        path: PathBuf,

        /// Where the photo comes from (camera, library, files)
        #[arg(long, default_value = "files")]
        source: ImageSource,

        /// Share the verdict after analysis
        #[arg(long)]
        share: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the verdict
    let log_filter = logging::init(std::io::stderr);

    info!(
        "Starting nh-client v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("NH_GIT_HASH"),
        env!("NH_BUILD_TIMESTAMP"),
        env!("NH_BUILD_PROFILE")
    );

    let config_path = config_file_path(args.config.as_deref());
    let toml_config = load_toml_config(config_path.as_deref()).context("Failed to load config file")?;
    log_filter
        .apply_config_level(&toml_config.logging.level)
        .context("Invalid logging configuration")?;

    let overrides = ClientOverrides {
        api_base_url: args.api_base_url.clone(),
        share_url: args.share_url.clone(),
    };
    let config = ClientConfig::resolve(overrides, &toml_config.client)
        .context("Invalid client configuration")?;
    info!("Relay: {}", config.api_base_url);

    match args.command {
        Command::Analyze { path, source, share } => run_analyze(config, path, source, share).await,
    }
}

async fn run_analyze(config: ClientConfig, path: PathBuf, source: ImageSource, share: bool) -> Result<()> {
    let manipulator = JpegManipulator::new().context("Failed to create scratch directory")?;
    let compressor = ImageCompressor::with_budget(Arc::new(manipulator), config.max_upload_bytes);
    let analyzer = RelayClient::new(&config.api_base_url).context("Failed to create relay client")?;

    let mut flow = FlowController::new(
        Arc::new(FilePicker::new(Some(path))),
        compressor,
        Arc::new(analyzer),
        Arc::new(ConsoleShare),
        config.app_name.clone(),
        config.share_url.clone(),
    );

    flow.pick_image(source).await;
    if flow.state() == FlowState::Preview {
        render(&flow.screen());
        flow.analyze().await;
    }

    render(&flow.screen());

    if flow.state() == FlowState::Idle {
        match flow.status_message() {
            Some(message) => bail!("{}", message),
            None => return Ok(()),
        }
    }

    if share {
        flow.share().await;
    }

    Ok(())
}

fn render(screen: &Screen<'_>) {
    match screen {
        // A status message is reported as the exit error
        Screen::Upload { status_message: None } => println!("No photo selected"),
        Screen::Upload { status_message: Some(_) } => {}
        Screen::Preview {
            file_name,
            analyzing,
            ..
        } => {
            if *analyzing {
                println!("Analyzing {}...", file_name);
            } else {
                println!("Ready to analyze {}", file_name);
            }
        }
        Screen::Result { result, .. } => {
            if result.is_hamburger {
                println!("HAMBURGER");
            } else {
                println!("NOT HAMBURGER");
            }
        }
    }
}
