use crash_insights::config::Config;
use crash_insights::service::{build_router, AppState, Dataset};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration from environment variables
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            eprintln!("💡 Optional environment variables:");
            eprintln!("   - LISTEN_ADDR: address to bind (default: 127.0.0.1:3001)");
            eprintln!("   - MAX_UPLOAD_BYTES: upload size limit (default: 33554432)");
            eprintln!("   - LOG_LEVEL: tracing filter (default: info)");
            eprintln!("   - PRELOAD_PATH: export file to load at startup");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    config.log_config();

    let dataset = match config.preload_path {
        Some(ref path) => {
            let dataset = Dataset::load(path)?;
            info!(
                "Preloaded {} records from {}",
                dataset.records.len(),
                path.display()
            );
            dataset
        }
        None => Dataset::default(),
    };

    let app_state = Arc::new(AppState::new(dataset));
    let app = build_router(app_state, config.max_upload_bytes);

    info!("🚀 Crash insights API starting on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
