/// Authentication middleware
use crate::{
    error::ServerError,
    services::session::{SessionService, SESSION_COOKIE},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use curator_core::UserId;
use std::sync::Arc;

/// Extension type to store authenticated user ID in request
/// Can be used as an extractor in handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn user_id(&self) -> UserId {
        self.0
    }
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));
    if bearer.is_some() {
        return bearer;
    }

    cookie_value(headers, SESSION_COOKIE).filter(|value| !value.is_empty())
}

/// Value of the named cookie, if sent
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Resolve the session user without rejecting the request
pub fn session_user(sessions: &SessionService, headers: &HeaderMap) -> Option<UserId> {
    let token = session_token(headers)?;
    sessions
        .verify_token(token)
        .map_err(|e| tracing::debug!("Session verification failed: {}", e))
        .ok()
}

/// Middleware that rejects requests without a valid session
pub async fn auth_middleware(
    State(sessions): State<Arc<SessionService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let user_id = session_user(&sessions, request.headers())
        .ok_or_else(|| ServerError::Auth("Not authenticated".to_string()))?;

    // Insert user ID into request extensions
    request.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ServerError::Auth("Not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(session_token(&headers), Some("abc"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; curator_session=xyz; other=1"),
        );
        assert_eq!(session_token(&headers), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("curator_session="));
        assert_eq!(session_token(&headers), None);
    }
}
