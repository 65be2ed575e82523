use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::{debug, warn};

use super::request_context::RequestContext;
use super::token::TokenIssuer;
use crate::error::AppError;

/// Whether an operation may run without a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    Public,
    Bearer,
}

/// Internal reasons a credential header was refused. Logged, never returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing authorization header")]
    Missing,
    #[error("authorization header is not visible ASCII")]
    NotText,
    #[error("missing token")]
    Blank,
    #[error("expected `<scheme> <token>`")]
    Shape,
    #[error("unsupported scheme")]
    Scheme,
}

/// Extract the token from `Bearer <token>` (scheme case-insensitive, exactly one token).
pub fn parse_bearer(value: &str) -> Result<&str, BearerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BearerError::Blank);
    }
    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(BearerError::Shape);
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerError::Scheme);
    }
    if token.is_empty() {
        return Err(BearerError::Shape);
    }
    Ok(token)
}

fn bearer_from_headers(headers: &HeaderMap) -> Result<&str, BearerError> {
    let raw = headers.get(AUTHORIZATION).ok_or(BearerError::Missing)?;
    let value = raw.to_str().map_err(|_| BearerError::NotText)?;
    parse_bearer(value)
}

/// Decides, per operation requirement, whether a request may proceed and with what identity.
#[derive(Clone)]
pub struct Gate {
    issuer: Arc<TokenIssuer>,
}

impl Gate {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self { Self { issuer } }

    /// Public operations pass through unauthenticated. Bearer operations need a
    /// valid, unexpired token; every failure collapses into `AuthorizationInvalid`.
    pub fn authorize(&self, requirement: AuthRequirement, headers: &HeaderMap) -> Result<RequestContext, AppError> {
        if requirement == AuthRequirement::Public {
            return Ok(RequestContext::Unauthenticated);
        }
        let token = bearer_from_headers(headers).map_err(|e| {
            warn!(target: "identity", "authorization header rejected: {}", e);
            AppError::authorization()
        })?;
        let claims = self.issuer.verify(token).map_err(|e| {
            warn!(target: "identity", "bearer token rejected: {}", e);
            AppError::authorization()
        })?;
        Ok(RequestContext::Authenticated(claims))
    }
}

/// Middleware attached to every route whose operation requires a bearer token.
pub async fn require_bearer(State(gate): State<Gate>, mut req: Request, next: Next) -> Result<Response, AppError> {
    debug!(target: "identity", path = %req.uri().path(), "checking bearer credential");
    let ctx = gate.authorize(AuthRequirement::Bearer, req.headers())?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
