//! Sampurana - Gemini chat with voice input
//!
//! Main entry point for the desktop application.

use eframe::egui;
use sampurana::ui::SampuranaApp;
use sampurana::AppConfig;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sampurana=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sampurana");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Ignoring configuration file: {}", e);
        let mut config = AppConfig::default();
        config.apply_env();
        config
    });

    if !config.chat.has_credentials() {
        warn!("No Gemini API key configured; chat will be unavailable");
    }
    info!("Using model {}", config.chat.model);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 820.0])
            .with_min_inner_size([400.0, 400.0])
            .with_title("Gemini Sampurana Chat"),
        ..Default::default()
    };

    eframe::run_native(
        "Sampurana",
        options,
        Box::new(move |cc| Ok(Box::new(SampuranaApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))
}
