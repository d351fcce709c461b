//! Line-scan viewer - egui desktop application
//!
//! ```bash
//! line-scan-viewer --url ws://scanner.local:8000/ws/stream --record
//! line-scan-viewer --headless --url 127.0.0.1
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use scan_client::{resolve_address, SessionConfig};
use scan_core::ViewerConfig;
use scan_egui::logging::{self, LogFormat, TracingConfig};
use scan_egui::{LineScanApp, ViewerOptions};

#[derive(Parser)]
#[command(name = "line-scan-viewer")]
#[command(about = "Real-time line-scan stream viewer", long_about = None)]
struct Cli {
    /// Stream URL (scheme, port and path are filled in when omitted)
    #[arg(long)]
    url: Option<String>,

    /// Configuration file
    #[arg(long, default_value = scan_core::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level; overrides application.log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Run without a window, logging stream status and throughput
    #[arg(long)]
    headless: bool,

    /// Start recording immediately
    #[arg(long)]
    record: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ViewerConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.application.log_level = level;
    }
    config.validate()?;

    let tracing_config = TracingConfig::from_viewer_config(&config)
        .map_err(anyhow::Error::msg)?
        .with_format(cli.log_format)
        .with_ansi(std::io::stdout().is_terminal());
    logging::init(tracing_config).map_err(anyhow::Error::msg)?;

    tracing::info!(name = %config.application.name, "Starting line-scan viewer");

    if cli.headless {
        return run_headless(cli.url, config);
    }

    let title = config.application.name.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title(&title),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };
    let viewer_options = ViewerOptions {
        config,
        url: cli.url,
        record: cli.record,
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(LineScanApp::new(cc, viewer_options)?))),
    )
    .map_err(|e| anyhow::anyhow!("viewer window failed: {e}; try --headless"))
}

fn run_headless(url: Option<String>, config: ViewerConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let user_url = url.or_else(|| config.stream.url.clone());
    let address = resolve_address(user_url.as_deref(), None);
    let session_config = SessionConfig {
        reconnect_delay: config.reconnect_delay(),
        default_max_lines: config.display.default_max_lines,
    };

    runtime.block_on(async {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        };
        scan_egui::run_until(address, session_config, config.zoom_limits(), shutdown).await
    });
    Ok(())
}
