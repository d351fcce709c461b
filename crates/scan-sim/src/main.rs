//! Line-scan camera simulator.
//!
//! ```bash
//! line-scan-sim --bind 127.0.0.1:8000 --width 2048 --rate 500
//! line-scan-sim --image sample.png
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scan_core::DEFAULT_MAX_LINES;
use scan_sim::{serve, SimState, SourceSpec, FALLBACK_LINES};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "line-scan-sim")]
#[command(about = "Serve simulated line-scan rows over WebSocket", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Grayscale image to stream row by row (overrides --width)
    #[arg(long, env = "LINE_SCAN_IMAGE_PATH")]
    image: Option<PathBuf>,

    /// Row width of the synthetic pattern
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Ring capacity announced to clients
    #[arg(long, default_value_t = DEFAULT_MAX_LINES)]
    max_lines: u32,

    /// Rows per second
    #[arg(long, default_value_t = 200.0)]
    rate: f64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = match &cli.image {
        Some(path) => SourceSpec::load_image(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SourceSpec::Synthetic {
            width: cli.width,
            height: FALLBACK_LINES,
        },
    };
    let state = SimState::new(source, cli.max_lines, cli.rate)?;

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;

    tokio::select! {
        result = serve(listener, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }
    Ok(())
}
