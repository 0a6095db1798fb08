use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use uuid::Uuid;

use video_room::config::RoomConfig;
use video_room::{AppState, router};

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

#[derive(Parser)]
#[command(name = "video-room")]
#[command(about = "Signaling server for peer-to-peer video rooms")]
struct Args {
    /// Path to a config.toml (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Port for the web server, 0 for automatic (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let default_directive = if args.debug {
        "video_room=debug,tower_http=debug,info"
    } else {
        "video_room=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let mut config = RoomConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = config.server.bind_addr()?;
    info!(
        "Media constraints: video={} audio={}",
        config.media.video, config.media.audio
    );

    let state = AppState::new(config);
    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let actual_addr = listener.local_addr()?;

    info!("Video Room listening on http://{}", actual_addr);
    info!("");
    info!("Endpoints:");
    info!("  GET  /                  - Create a room and redirect to it");
    info!("  GET  /{{room_id}}         - Room view");
    info!("  GET  /ws                - Signaling WebSocket");
    info!("  GET  /api/rooms/{{id}}    - Room participants");
    info!("  GET  /health            - Health check");
    info!("  GET  /metrics           - Server metrics");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, exiting gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}
