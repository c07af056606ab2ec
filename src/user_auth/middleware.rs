use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::gateway::state::AppState;
use crate::gateway::types::ApiError;

/// Bearer-token middleware for the private routes.
///
/// Verifies the HS256 token and injects the verified account id into
/// request extensions; handlers never see credentials.
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid token format"))?;

    match state.auth.verify_token(token) {
        Ok(subject) => {
            request.extensions_mut().insert(subject);
            Ok(next.run(request).await)
        }
        Err(_) => Err(ApiError::unauthorized("Invalid or expired token")),
    }
}
