// src/main.rs

use bson::doc;
use chem_institute_api::config::Config;
use chem_institute_api::routes;
use chem_institute_api::state::AppState;
use dotenvy::dotenv;
use mongodb::{Client, Database};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_ATTEMPTS: u32 = 5;
const IN_MEMORY_URI: &str = "memory";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let state = if config.mongodb_uri == IN_MEMORY_URI {
        tracing::warn!("MONGODB_URI=memory: data is kept in process and lost on exit");
        AppState::in_memory(config.clone())?
    } else {
        let db = connect_with_retry(&config).await?;
        tracing::info!("Database connected ({})", config.mongodb_db);
        AppState::with_mongo(config.clone(), &db)?
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The driver connects lazily, so readiness is checked with `ping`.
async fn connect_with_retry(config: &Config) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let db = client.database(&config.mongodb_db);

    let mut retry_count = 0;
    loop {
        match db.run_command(doc! { "ping": 1 }, None).await {
            Ok(_) => return Ok(db),
            Err(e) => {
                retry_count += 1;
                if retry_count >= CONNECT_ATTEMPTS {
                    tracing::error!("Failed to reach MongoDB after {} attempts", retry_count);
                    return Err(e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {}): {}",
                    retry_count,
                    e
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
