//! Application Assembly
//! Mission: Wire stores, auth layers, and routes into one axum router

use crate::auth::{
    api as auth_api, enforce_access_policy, request_gate, AccessPolicy, AccountStore, AuthState,
    GateState, IdentityResolver, LoginThrottle, TokenService,
};
use crate::blog::{api as blog_api, BlogState, BlogStore};
use crate::config::Config;
use crate::middleware::request_logging;
use anyhow::{Context, Result};
use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Build the full application router.
///
/// The request gate runs ahead of the access policy, which runs ahead of
/// every handler; the gate only binds identity, the policy alone rejects.
pub fn build_router(config: &Config) -> Result<Router> {
    let accounts = Arc::new(
        AccountStore::new(&config.auth_db_path).context("Failed to open account store")?,
    );
    let blog = Arc::new(BlogStore::new(&config.blog_db_path).context("Failed to open blog store")?);

    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.jwt_expiration_secs,
    ));
    let throttle = Arc::new(LoginThrottle::new(
        config.login_max_failures,
        Duration::from_secs(config.login_window_secs),
    ));
    let policy = Arc::new(AccessPolicy::baseline(crate::auth::policy::ADMIN_ROLE));

    info!("🔐 Authentication initialized at: {}", config.auth_db_path);

    let auth_state = AuthState {
        accounts: accounts.clone(),
        tokens: tokens.clone(),
        throttle,
        default_signup_role: config.default_signup_role.clone(),
    };
    let gate_state = GateState {
        tokens,
        resolver: IdentityResolver::new(accounts),
    };
    let blog_state = BlogState { store: blog };

    let auth_routes = Router::new()
        .route("/api/v1/auth/login", post(auth_api::login))
        .route("/api/v1/auth/signup", post(auth_api::signup))
        .with_state(auth_state);

    let blog_routes = Router::new()
        .route(
            "/api/v1/posts",
            get(blog_api::list_posts).post(blog_api::create_post),
        )
        .route(
            "/api/v1/posts/:post_id",
            get(blog_api::get_post)
                .put(blog_api::update_post)
                .delete(blog_api::delete_post),
        )
        .route(
            "/api/v1/posts/:post_id/comments",
            get(blog_api::list_comments).post(blog_api::create_comment),
        )
        .route(
            "/api/v1/posts/:post_id/comments/:comment_id",
            get(blog_api::get_comment)
                .put(blog_api::update_comment)
                .delete(blog_api::delete_comment),
        )
        .with_state(blog_state);

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(blog_routes)
        .layer(middleware::from_fn_with_state(policy, enforce_access_policy))
        .layer(middleware::from_fn_with_state(gate_state, request_gate))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    Ok(app)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
