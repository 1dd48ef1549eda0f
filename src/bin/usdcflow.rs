//! USDC Flow - live terminal view of the transfer feed
//!
//! Polls the configured endpoint on a fixed interval, keeps the last changed
//! snapshot, and filters it by signature prefix as you type.

use std::sync::Arc;
use usdcflow::{
    pipeline::{HttpFetcher, PollScheduler},
    ui, Config, FeedController,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Logs go to stderr; without RUST_LOG only errors are shown so the UI stays clean
    let mut builder = if config.rust_log.is_some() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    } else {
        env_logger::Builder::from_default_env()
    };
    builder.target(env_logger::Target::Stderr).init();

    log::info!("🚀 Starting USDC Flow...");
    log::info!("📊 Configuration:");
    log::info!("   API_URL: {}", config.api_url);
    log::info!("   Refresh interval: {}ms", config.refresh_interval.as_millis());
    log::info!("   Request timeout: {}ms", config.request_timeout.as_millis());
    if !config.initial_filter.is_empty() {
        log::info!("   Initial filter: {}", config.initial_filter);
    }

    let fetcher = HttpFetcher::new(config.api_url.clone(), config.request_timeout)?;
    let controller = FeedController::new(config.initial_filter.clone());

    let poller = PollScheduler::new(Arc::new(fetcher), controller.clone(), config.refresh_interval).spawn();

    if let Err(e) = ui::run_ui(controller).await {
        log::error!("UI error: {}", e);
    }

    poller.stop().await;
    log::info!("UI exited");

    Ok(())
}
