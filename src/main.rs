mod api;
mod capture;
mod models;
mod utils;

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use clap::Parser;
use log::info;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::routes;
use crate::capture::session::{CaptureSession, SharedSession};
use crate::capture::source::PcapBackend;
use crate::models::config::AppConfig;
use crate::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "A network traffic monitoring backend with REST API")]
struct Args {
    /// Network interface to start capturing on immediately
    #[clap(short, long)]
    interface: Option<String>,

    /// Port for the REST API server
    #[clap(short, long, default_value = "3000")]
    port: u16,

    /// Enable promiscuous mode
    #[clap(short = 'P', long)]
    promiscuous: bool,

    /// BPF filter expression
    #[clap(long)]
    filter: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info")]
    log_level: String,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logger(logging::get_log_level(&args.log_level));

    info!("Starting netmeter v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig {
        interface: args.interface,
        port: args.port,
        promiscuous: args.promiscuous,
        filter: args.filter,
    };

    let session: SharedSession = Arc::new(RwLock::new(CaptureSession::new(
        Arc::new(PcapBackend),
        config.capture_config(),
    )));

    match capture::interfaces::list() {
        Ok(interfaces) => {
            for iface in &interfaces {
                info!("Found interface: {}", iface.formatted_display());
            }
        }
        Err(e) => log::warn!("Interface enumeration failed at startup: {e}"),
    }

    // An interface given on the command line starts a session right away;
    // failures are reported but the server still comes up so the API can be
    // used to retry.
    if let Some(interface) = &config.interface {
        match session.write().await.start(interface).await {
            Ok(()) => {
                info!("Capture started on {interface}");
                spawn_stats_logger(Arc::clone(&session));
            }
            Err(e) => log::error!("Initial capture on {interface} failed: {e}"),
        }
    }

    let app_state = web::Data::new(Arc::clone(&session));

    info!("Starting netmeter API server on port {}", config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(("127.0.0.1", config.port))?
    .run()
    .await?;

    // Leave the device in a clean state on shutdown.
    session.write().await.stop().await.ok();

    Ok(())
}

/// Log traffic totals periodically for as long as the session stays active.
fn spawn_stats_logger(session: SharedSession) {
    let mut stats = capture::delivery::spawn_poller(session, std::time::Duration::from_secs(30));
    tokio::spawn(async move {
        while let Some(snap) = stats.recv().await {
            info!(
                "Traffic on {}: {} packets, {} bytes",
                snap.interface.as_deref().unwrap_or("?"),
                snap.total_packets,
                snap.total_bytes
            );
        }
    });
}
