mod app;
mod auth;
mod config;
mod error;
mod extract;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "folio_auth=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        expose_error_details = config.expose_error_details,
        "configuration loaded"
    );
    let addr = config.bind_addr();

    let app_state = AppState::init(config).await?;
    app::serve(app::build_app(app_state), &addr).await
}
