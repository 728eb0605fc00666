use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use event_server::auth::JwtIdentityProvider;
use event_server::config::Config;
use event_server::routes::create_routes;
use event_server::services::EventService;
use event_server::state::AppState;
use event_server::storage::HttpObjectStorage;
use event_server::store::{EventStore, MemoryEventStore, PgEventStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn EventStore> = match &config.database_url {
        Some(database_url) => {
            let store =
                PgEventStore::connect(database_url, config.database_max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, events are kept in memory only");
            Arc::new(MemoryEventStore::new())
        }
    };
    let storage = Arc::new(HttpObjectStorage::new(&config.storage)?);
    let identity = Arc::new(JwtIdentityProvider::new(&config.jwt_secret));

    let events = EventService::new(store, storage, config.storage.url_expires_at);
    let app = create_routes(AppState::new(events, identity), &config.http);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
