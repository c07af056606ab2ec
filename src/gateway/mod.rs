//! HTTP gateway: axum routes, auth layering and server startup.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::user_auth::jwt_auth_middleware;
use openapi::ApiDoc;
use state::AppState;

/// Build the complete router over shared state.
///
/// Public: health check and Swagger UI. Private: transfer and account
/// routes behind the bearer-token middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let private_routes = Router::new()
        .route("/transfers", post(handlers::create_transfer))
        .route("/transfers/history", get(handlers::get_history))
        .route("/account/balance", get(handlers::get_balance))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health_check))
        .merge(private_routes)
        .with_state(state)
}

/// Start the HTTP gateway server.
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("gateway listening on http://{addr}");
    info!("swagger ui on http://{addr}/docs");

    axum::serve(listener, app).await?;
    Ok(())
}
