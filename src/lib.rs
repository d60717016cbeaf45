pub mod auth;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use auth::{Authentication, TokenAuthenticationService};
pub use db::{Database, MemoryStore, Repositories};
pub use services::ScopeService;
pub use state::AppState;
pub use utils::{ApiError, ApiResult, Config};

use auth::{auth_middleware, require_auth};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use handlers::{auth as auth_handlers, scopes};
use middleware::{
    cors_layer, health_check, propagate_request_id_layer, request_id_layer, trace_layer,
};
use tower::ServiceBuilder;

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/scope", get(scopes::list_scopes))
        .route("/api/scope/:scope_id", get(scopes::get_scope))
        .route(
            "/api/scopecollector/:collector_id",
            get(scopes::scopes_by_collector),
        )
        .route(
            "/api/scopecollector/page/:collector_id",
            get(scopes::scopes_by_collector_page),
        );

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_handlers::me))
        .layer(from_fn(require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer())
                .layer(request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(cors_layer(&state.config))
                .layer(from_fn_with_state(
                    state.auth_service.clone(),
                    auth_middleware,
                )),
        )
        .with_state(state)
}
