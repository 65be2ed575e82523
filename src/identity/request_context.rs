use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::Claims;
use crate::error::AppError;

/// Per-request authentication state, placed in the request extensions by the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestContext {
    #[default]
    Unauthenticated,
    Authenticated(Claims),
}

impl RequestContext {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            RequestContext::Authenticated(c) => Some(c),
            RequestContext::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool { self.claims().is_some() }
}

/// Extractor for handlers of gated operations; yields the verified claims.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<RequestContext>() {
            Some(RequestContext::Authenticated(claims)) => Ok(Authenticated(claims.clone())),
            _ => Err(AppError::authorization()),
        }
    }
}
