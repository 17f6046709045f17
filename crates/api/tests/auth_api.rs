//! HTTP-level integration tests for the `/api/auth` endpoints.
//!
//! Flows run against both refresh-token stores, since the two must be
//! indistinguishable from a client's point of view.

mod common;

use axum::http::header::SET_COOKIE;
use axum::http::{Method, StatusCode};
use axum::Router;
use common::{body_json, delete_json, post_json, put_json, send};
use serde_json::json;
use sqlx::PgPool;
use tollgate_api::auth::jwt;
use tollgate_api::config::RefreshTokenStore;
use tollgate_db::repositories::{AuthenticationRepo, UserRepo};

const STORES: [RefreshTokenStore; 2] = [RefreshTokenStore::Database, RefreshTokenStore::Cache];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn alice() -> serde_json::Value {
    json!({
        "username": "alice",
        "email": "alice@x.com",
        "phone": "0800",
        "password": "pw",
    })
}

async fn register(app: &Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = post_json(app.clone(), "/api/auth/register", body).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Log in and return `data` of the response.
async fn login(app: &Router, username: &str, password: &str) -> serde_json::Value {
    let body = json!({ "username": username, "password": password });
    let response = post_json(app.clone(), "/api/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn refresh(app: &Router, token: &str) -> (StatusCode, serde_json::Value) {
    let response = put_json(
        app.clone(),
        "/api/auth/refresh",
        json!({ "refresh_token": token }),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn logout(app: &Router, token: &str) -> StatusCode {
    delete_json(
        app.clone(),
        "/api/auth/logout",
        json!({ "refresh_token": token }),
    )
    .await
    .status()
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_returns_201_with_username(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let (status, json) = register(&app, alice()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["meta"]["code"], "201");
    assert_eq!(json["meta"]["message"], "user registered successfully");
    assert_eq!(json["data"], "alice");

    let user = UserRepo::find_by_username(&pool, "alice")
        .await
        .unwrap()
        .expect("user should be persisted");
    assert_eq!(user.email, "alice@x.com");
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_duplicate_username_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, alice()).await;

    let mut second = alice();
    second["email"] = json!("b@x.com");
    let (status, json) = register(&app, second).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "username or email already exists");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_duplicate_email_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, alice()).await;

    let mut second = alice();
    second["username"] = json!("bob");
    let (status, json) = register(&app, second).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "username or email already exists");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_validation_errors(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    for (field, value) in [
        ("email", json!("not-an-email")),
        ("username", json!("  ")),
        ("phone", json!("0".repeat(21))),
        ("password", json!("")),
    ] {
        let mut body = alice();
        body[field] = value;
        let (status, json) = register(&app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "field {field}");
        assert_eq!(json["code"], "VALIDATION_ERROR", "field {field}");
    }

    assert!(UserRepo::find_by_username(&pool, "alice").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_malformed_json_is_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/auth/register", json!({ "username": "alice" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_returns_tokens_for_submitted_username(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register(&app, alice()).await;

    let response = post_json(
        app.clone(),
        "/api/auth/login",
        json!({ "username": "alice", "password": "pw" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("auth-token=") && c.contains("Max-Age=900")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh-token=") && c.contains("Max-Age=86400")));

    let json = body_json(response).await;
    assert_eq!(json["meta"]["code"], "200");
    let access = json["data"]["access_token"].as_str().unwrap();
    let refresh = json["data"]["refresh_token"].as_str().unwrap();

    let access_claims = jwt::verify_and_decode(common::ACCESS_SECRET, access).unwrap();
    let refresh_claims = jwt::verify_and_decode(common::REFRESH_SECRET, refresh).unwrap();
    assert_eq!(access_claims.sub.as_deref(), Some("alice"));
    assert_eq!(refresh_claims.sub.as_deref(), Some("alice"));

    // Database store: the refresh token row exists before the response.
    assert!(AuthenticationRepo::exists(&pool, refresh).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_failures_share_one_message(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, alice()).await;

    let wrong_password = post_json(
        app.clone(),
        "/api/auth/login",
        json!({ "username": "alice", "password": "wrongpw" }),
    )
    .await;
    let unknown_user = post_json(
        app,
        "/api/auth/login",
        json!({ "username": "ghost", "password": "anypw" }),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a = body_json(wrong_password).await;
    let b = body_json(unknown_user).await;
    assert_eq!(a, b);
    assert_eq!(a["error"], "email or password is invalid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_username_longer_than_50_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/auth/login",
        json!({ "username": "a".repeat(51), "password": "pw" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Refresh / logout, against both stores
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_mints_new_access_token(pool: PgPool) {
    for store in STORES {
        sqlx::query("TRUNCATE users CASCADE")
            .execute(&pool)
            .await
            .unwrap();
        let (app, _) = common::build_test_app_with(pool.clone(), store);
        register(&app, alice()).await;
        let tokens = login(&app, "alice", "pw").await;
        let refresh_token = tokens["refresh_token"].as_str().unwrap();

        let (status, json) = refresh(&app, refresh_token).await;
        assert_eq!(status, StatusCode::OK, "{store:?}");
        assert_eq!(json["meta"]["message"], "refresh token successfully");

        let access = json["data"]["access_token"].as_str().unwrap();
        let claims = jwt::verify_and_decode(common::ACCESS_SECRET, access).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("alice"));
        assert!(json["data"].get("refresh_token").is_none(), "refresh token is not rotated");

        // Still redeemable: the refresh token is not consumed by refreshing.
        let (status, _) = refresh(&app, refresh_token).await;
        assert_eq!(status, StatusCode::OK, "{store:?}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_after_logout_is_unauthorized(pool: PgPool) {
    for store in STORES {
        sqlx::query("TRUNCATE users CASCADE")
            .execute(&pool)
            .await
            .unwrap();
        let (app, _) = common::build_test_app_with(pool.clone(), store);
        register(&app, alice()).await;
        let tokens = login(&app, "alice", "pw").await;
        let refresh_token = tokens["refresh_token"].as_str().unwrap();

        assert_eq!(logout(&app, refresh_token).await, StatusCode::OK);

        let (status, json) = refresh(&app, refresh_token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{store:?}");
        assert_eq!(json["error"], "token is invalid or expired");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_sessions_are_independent(pool: PgPool) {
    for store in STORES {
        sqlx::query("TRUNCATE users CASCADE")
            .execute(&pool)
            .await
            .unwrap();
        let (app, _) = common::build_test_app_with(pool.clone(), store);
        register(&app, alice()).await;

        // Back to back, so both logins normally land in the same second.
        let first = login(&app, "alice", "pw").await;
        let second = login(&app, "alice", "pw").await;
        let first = first["refresh_token"].as_str().unwrap();
        let second = second["refresh_token"].as_str().unwrap();
        assert_ne!(first, second, "{store:?}");

        assert_eq!(logout(&app, first).await, StatusCode::OK);

        let (status, _) = refresh(&app, first).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{store:?}");
        let (status, _) = refresh(&app, second).await;
        assert_eq!(status, StatusCode::OK, "{store:?}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_twice_succeeds(pool: PgPool) {
    for store in STORES {
        sqlx::query("TRUNCATE users CASCADE")
            .execute(&pool)
            .await
            .unwrap();
        let (app, cache) = common::build_test_app_with(pool.clone(), store);
        register(&app, alice()).await;
        let tokens = login(&app, "alice", "pw").await;
        let refresh_token = tokens["refresh_token"].as_str().unwrap();

        assert_eq!(logout(&app, refresh_token).await, StatusCode::OK);
        assert_eq!(logout(&app, refresh_token).await, StatusCode::OK);

        match store {
            RefreshTokenStore::Database => {
                assert!(!AuthenticationRepo::exists(&pool, refresh_token).await.unwrap());
            }
            RefreshTokenStore::Cache => {
                assert!(!cache.exists(&format!("refresh_token:{refresh_token}")).await);
                assert!(cache.exists(&format!("blacklisted:{refresh_token}")).await);
            }
        }
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_unknown_token_succeeds(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = delete_json(
        app,
        "/api/auth/logout",
        json!({ "refresh_token": "never-issued" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["message"], "user logged out successfully");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_rejects_undecodable_tokens(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, alice()).await;
    let tokens = login(&app, "alice", "pw").await;

    // An access token is signed with the other secret.
    let access_token = tokens["access_token"].as_str().unwrap();

    for token in ["garbage", "a.b.c", access_token] {
        let (status, json) = refresh(&app, token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "token is invalid or expired");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_blank_token_is_validation_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = put_json(app.clone(), "/api/auth/refresh", json!({ "refresh_token": " " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = put_json(app, "/api/auth/refresh", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_reads_token_from_cookie(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, alice()).await;
    let tokens = login(&app, "alice", "pw").await;
    let refresh_token = tokens["refresh_token"].as_str().unwrap();

    let response = send(
        app,
        Method::PUT,
        "/api/auth/refresh",
        Some(json!({})),
        Some(&format!("refresh-token={refresh_token}")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_accepts_camel_case_field(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, alice()).await;
    let tokens = login(&app, "alice", "pw").await;

    let response = put_json(
        app,
        "/api/auth/refresh",
        json!({ "refreshToken": tokens["refresh_token"] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_request_id_is_echoed(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/auth/login",
        json!({ "username": "ghost", "password": "pw" }),
    )
    .await;

    assert!(response.headers().get("x-request-id").is_some());
}
