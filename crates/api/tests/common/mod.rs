#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use tollgate_api::auth::jwt::JwtConfig;
use tollgate_api::config::{RefreshTokenStore, ServerConfig};
use tollgate_api::router::build_app_router;
use tollgate_api::services::{
    AuthService, CacheTokenLifecycle, CredentialStore, DatabaseTokenLifecycle, PgCredentialStore,
    TokenLifecycle, UserService,
};
use tollgate_api::state::AppState;
use tollgate_cache::Cache;

pub const ACCESS_SECRET: &str = "integration-access-secret";
pub const REFRESH_SECRET: &str = "integration-refresh-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(refresh_token_store: RefreshTokenStore) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        redis_url: None,
        redis_pool_size: 1,
        refresh_token_store,
        jwt: JwtConfig {
            access_secret: ACCESS_SECRET.to_string(),
            refresh_secret: REFRESH_SECRET.to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_mins: 1440,
        },
    }
}

/// Build the production router over `pool` and an in-process cache.
///
/// Returns the cache too, so tests can inspect lifecycle markers.
pub fn build_test_app_with(pool: PgPool, store: RefreshTokenStore) -> (Router, Cache) {
    let config = test_config(store);
    let cache = Cache::in_memory();

    let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool.clone()));
    let users = UserService::new(Arc::clone(&credentials), cache.clone());
    let lifecycle: Arc<dyn TokenLifecycle> = match store {
        RefreshTokenStore::Database => Arc::new(DatabaseTokenLifecycle::new(pool.clone())),
        RefreshTokenStore::Cache => Arc::new(CacheTokenLifecycle::new(cache.clone())),
    };
    let auth = AuthService::new(credentials, users, lifecycle, config.jwt.clone());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        auth,
    };

    (build_app_router(state, &config), cache)
}

/// Router with the default (database) refresh-token store.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, RefreshTokenStore::Database).0
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), None).await
}

pub async fn delete_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(body), None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
