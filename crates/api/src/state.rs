use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::AuthService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and the service are reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tollgate_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Register / login / refresh / logout orchestration.
    pub auth: AuthService,
}
