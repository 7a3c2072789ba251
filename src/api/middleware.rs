/// Rate-limit middleware
///
/// Resolves the caller's `AuthContext` once, counts the request against the
/// (identifier, endpoint) window and stashes the context in request extensions
/// for the handler's extractor.

use crate::{
    api::AppState,
    auth::AuthContext,
    error::ApiError,
    ratelimit::ActionClass,
};
use axum::{
    extract::{FromRequestParts, MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let auth = AuthContext::from_request_parts(&mut parts, &state).await?;

    let route = parts
        .extensions
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let endpoint = format!("{} {}", parts.method, route);
    let class = ActionClass::for_method(&parts.method);

    let admission = state
        .limiter
        .check(auth.identifier(), &endpoint, class)
        .await?;
    tracing::debug!("🚦 {} by {}: {:?}", endpoint, auth.identifier(), admission);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
