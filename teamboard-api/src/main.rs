//! # Teamboard API Server
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/teamboard JWT_SECRET=... cargo run -p teamboard-api
//! ```

use std::sync::Arc;
use teamboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use teamboard_shared::db::{
    migrations::{ensure_database_exists, run_migrations},
    pool::{close_pool, create_pool, DatabaseConfig},
};
use teamboard_shared::store::postgres::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamboard_api=debug,teamboard_shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Teamboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    if config.database.run_migrations {
        ensure_database_exists(&config.database.url).await?;
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
