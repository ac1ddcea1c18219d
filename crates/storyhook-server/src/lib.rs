pub mod github;
pub mod install;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use storyhook_core::config::Config;
use tower_http::trace::TraceLayer;

use crate::github::GithubClient;
use crate::state::AppState;

/// Build the axum Router for the webhook endpoint.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            &app_state.config.webhook_path,
            post(routes::webhook::receive)
                .layer(DefaultBodyLimit::max(routes::webhook::MAX_DELIVERY_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Create the GitHub client described by `config`.
pub fn github_client(config: &Config) -> anyhow::Result<GithubClient> {
    let token = config.require_token()?;
    GithubClient::new(
        &config.api_base,
        token,
        Duration::from_secs(config.request_timeout_secs.max(1)),
    )
}

/// Start the webhook server on a pre-bound listener.
///
/// The caller binds so it can read the actual port before starting (useful
/// when `port = 0` and the OS picks a free port).
pub async fn serve_on(config: Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    config.ensure_valid()?;
    let client = Arc::new(github_client(&config)?);
    let actual_port = listener.local_addr()?.port();
    let path = config.webhook_path.clone();
    let app = build_router(AppState::new(Arc::new(config), client));

    tracing::info!("storyhook listening on :{actual_port}{path}");

    axum::serve(listener, app).await?;
    Ok(())
}
