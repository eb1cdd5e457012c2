//! Shopgate server, the request-security pipeline for the shop backend.
//!
//! Entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use shopgate_core::config::AppConfig;
use shopgate_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("SHOPGATE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Shopgate v{}", env!("CARGO_PKG_VERSION"));

    // Database connection and migrations.
    tracing::info!("Connecting to database...");
    let db_pool = shopgate_database::connection::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    shopgate_database::migration::run_migrations(&db_pool).await?;

    // Distributed store (replay set + rate-limiter windows).
    tracing::info!(provider = %config.store.provider, "Initializing store provider...");
    let stores = shopgate_store::StoreManager::new(&config.store, &config.replay).await?;

    // Resilience guards for the screening dependencies.
    let resilience = shopgate_resilience::ResilienceRegistry::new(&config.resilience);

    let http = reqwest::Client::new();
    let geolocation = Arc::new(shopgate_auth::screening::GeolocationClient::new(
        http.clone(),
        config.screening.geolocation_url.clone(),
        resilience.guard("geolocation"),
    ));
    let breach = Arc::new(shopgate_auth::screening::BreachPasswordClient::new(
        http.clone(),
        config.screening.breach_password_url.clone(),
        resilience.guard("breach_password"),
    ));
    let captcha = Arc::new(shopgate_auth::screening::CaptchaClient::new(
        http,
        config.screening.captcha_url.clone(),
        config.screening.captcha_secret.clone(),
        resilience.guard("captcha"),
    ));

    // Pipeline components.
    let authenticator = Arc::new(shopgate_auth::token::TokenAuthenticator::new(&config.token)?);
    let replay_guard = Arc::new(shopgate_auth::replay::ReplayGuard::new(
        stores.replay(),
        config.replay.clone(),
    ));
    let device_repo = Arc::new(shopgate_database::DeviceFingerprintRepository::new(
        db_pool.clone(),
    ));
    let device_trust = Arc::new(shopgate_auth::device::DeviceTrustStore::new(
        device_repo,
        config.device.clone(),
        config.device.geolocate_new_addresses.then_some(geolocation),
    ));

    // Background sweep of expired replay entries.
    let cleanup =
        shopgate_auth::replay::ReplayCleanup::new(stores.replay(), &config.replay).spawn();

    let state = shopgate_api::AppState {
        config: Arc::new(config.clone()),
        authenticator,
        replay_guard,
        device_trust,
        rate_limit_store: stores.rate_limit(),
        breach,
        captcha,
    };

    let app = shopgate_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::with_source(
            shopgate_core::error::ErrorKind::Internal,
            format!("Failed to bind {addr}"),
            e,
        ))?;

    tracing::info!("Shopgate server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    cleanup.abort();
    tracing::info!("Shopgate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
