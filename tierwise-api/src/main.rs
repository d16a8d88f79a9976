use std::net::SocketAddr;
use std::sync::Arc;
use tierwise_api::{app, state::{AppState, AuthConfig}};
use tierwise_cart::HubConfig;
use tierwise_store::{app_config::Config, DbClient, PgCartRepository, PgProductRepository, PgTierRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tierwise_api=debug,tierwise_cart=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Tierwise API on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };
    let hub_config = HubConfig {
        dedup_window_ms: config.notifications.dedup_window_ms,
        channel_capacity: config.notifications.channel_capacity,
        fallback_multiplier: config.pricing.guest_fallback_multiplier,
        max_tracked_users: config.notifications.max_tracked_users,
    };

    let app_state = match config.database.url.as_deref() {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections).await?;
            db.migrate().await?;
            tracing::info!("Using PostgreSQL storage");

            AppState::new(
                Arc::new(PgTierRepository::new(db.pool.clone())),
                Arc::new(PgProductRepository::new(db.pool.clone())),
                Arc::new(PgCartRepository::new(db.pool.clone())),
                auth,
                hub_config,
            )
        }
        None => {
            tracing::warn!("No database configured, using in-memory storage");
            AppState::in_memory(auth, hub_config)
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
