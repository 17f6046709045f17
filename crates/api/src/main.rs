use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tollgate_api::background;
use tollgate_api::config::{RefreshTokenStore, ServerConfig};
use tollgate_api::router::build_app_router;
use tollgate_api::services::{
    AuthService, CacheTokenLifecycle, CredentialStore, DatabaseTokenLifecycle, PgCredentialStore,
    TokenLifecycle, UserService,
};
use tollgate_api::state::AppState;
use tollgate_cache::{Cache, MemoryCache, RedisCache};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        refresh_token_store = ?config.refresh_token_store,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = tollgate_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    tollgate_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    tollgate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Cache ---
    let (cache, memory) = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::connect(url, config.redis_pool_size)
                .await
                .expect("Failed to connect to Redis");
            (Cache::new(Arc::new(redis)), None)
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-process cache");
            let memory = Arc::new(MemoryCache::new());
            (Cache::new(memory.clone()), Some(memory))
        }
    };

    // --- Services ---
    let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool.clone()));
    let users = UserService::new(Arc::clone(&credentials), cache.clone());
    let lifecycle: Arc<dyn TokenLifecycle> = match config.refresh_token_store {
        RefreshTokenStore::Database => Arc::new(DatabaseTokenLifecycle::new(pool.clone())),
        RefreshTokenStore::Cache => Arc::new(CacheTokenLifecycle::new(cache.clone())),
    };
    let auth = AuthService::new(credentials, users, lifecycle, config.jwt.clone());

    // --- Token retention ---
    let retention_cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(background::token_retention::run(
        pool.clone(),
        memory,
        config.jwt.refresh_ttl(),
        retention_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        auth,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        retention_handle,
    )
    .await;
    tracing::info!("Token retention job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tollgate_api=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
