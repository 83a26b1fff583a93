pub mod auth;
mod error;
mod stats;
mod validation;
mod waitlist;

pub use error::{ApiError, ErrorCode};

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public). Logout clears the cookie unconditionally.
    let auth_routes = Router::new()
        .route("/auth", post(auth::login))
        .route("/auth", delete(auth::logout));

    // Admin routes, gated on the session cookie
    let admin_routes = Router::new()
        .route("/stats", get(stats::dashboard))
        .route("/waitlist/export", get(waitlist::export_csv))
        .route("/waitlist/:id", put(waitlist::update))
        .route("/waitlist/:id", delete(waitlist::remove))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::admin_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/waitlist", post(waitlist::signup))
        .route("/waitlist", get(waitlist::list))
        .nest("/admin", auth_routes.merge(admin_routes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check with a store connectivity probe
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM waitlist")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check database probe failed");
            "unreachable"
        }
    };

    Json(serde_json::json!({ "status": "ok", "database": database }))
}
