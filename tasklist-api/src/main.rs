//! # Tasklist API Server
//!
//! Multi-user task-list service: users register or sign in (password or
//! external identity token) and manage their own tasks over a JSON HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tasklist-api
//! ```

use std::sync::Arc;

use tasklist_api::app::{build_router, AppState};
use tasklist_api::config::Config;
use tasklist_shared::db::{migrations, pool};
use tasklist_shared::mail::SmtpNotifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasklist_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tasklist API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(config.database.clone()).await?;
    migrations::run_migrations(&db).await?;

    let notifier = Arc::new(SmtpNotifier::new(&config.mail)?);
    if config.google.client_id.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set; external identity login is disabled");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, notifier);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
