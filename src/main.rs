use std::collections::HashMap;
use std::sync::Arc;

use simbroker::api::routes::{app_router, AppState, Backend, Credential, MemoryBackend};
use simbroker::demo::DemoSession;
use simbroker::persistence::{list_profiles, PgStore};
use simbroker::quotes::{HttpMarketData, QuoteFeed};
use simbroker::settlement::TimerSimulator;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut credentials = HashMap::new();
    let backend = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let max_connections = std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5);
            let store = PgStore::connect(&database_url, max_connections).await.unwrap();
            for profile in list_profiles(store.pool()).await.unwrap() {
                credentials.insert(
                    profile.username.clone(),
                    Credential {
                        user_id: profile.id,
                        username: profile.username,
                        password_hash: profile.password_hash,
                    },
                );
            }
            Backend::Postgres(store)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, running in demo mode (nothing is persisted)");
            Backend::Memory(MemoryBackend::new(DemoSession::new(Uuid::new_v4(), 10_000.0)))
        }
    };

    let jwt_secret = std::env::var("JWT_SECRET")
        .expect("JWT_SECRET must be set")
        .into_bytes();

    let state = AppState {
        backend,
        feed: Arc::new(QuoteFeed::new(HttpMarketData::from_env())),
        simulator: Arc::new(TimerSimulator::default()),
        jwt_secret: Arc::new(jwt_secret),
        credentials: Arc::new(RwLock::new(credentials)),
    };

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!(%bind_addr, "simbroker listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app_router(state)).await.unwrap();
}
