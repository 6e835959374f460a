pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod media;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod urls;
pub mod views;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::media::{MediaStorage, MEDIA_URL};
use crate::middleware::auth_redirect::redirect_unauthorized;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let media = MediaStorage::new(config.media_root.clone());
    let max_upload_size = config.max_upload_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        admin: admin::site(),
        media,
        login_limiter: LoginRateLimiter::default(),
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(views::view_routes())
        .merge(views::admin_routes().layer(axum::middleware::from_fn(redirect_unauthorized)))
        .nest_service(MEDIA_URL, ServeDir::new(state.media.root()))
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

/// Create the configured staff account when the console has none yet.
pub async fn ensure_bootstrap_admin(pool: &PgPool, config: &Config) -> Result<(), String> {
    let Some(bootstrap) = &config.bootstrap_admin else {
        return Ok(());
    };

    let existing = db::admin_users::count_all(pool)
        .await
        .map_err(|e| format!("Failed to count staff accounts: {e}"))?;
    if existing > 0 {
        tracing::debug!("Staff accounts exist, skipping bootstrap");
        return Ok(());
    }

    let hash = auth::password::hash(&bootstrap.password)?;
    let name = bootstrap
        .email
        .split('@')
        .next()
        .unwrap_or(&bootstrap.email)
        .to_string();
    let user = db::admin_users::create(pool, &bootstrap.email, &hash, &name)
        .await
        .map_err(|e| format!("Failed to create bootstrap staff account: {e}"))?;

    tracing::info!(user_id = %user.id, email = %user.email, "Created bootstrap staff account");
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
