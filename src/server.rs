//!
//! userdir HTTP server
//! --------------------
//! Axum router for the directory RPC surface. Every operation is `POST
//! /rpc/<Operation>` with a JSON body; gated operations get the bearer
//! middleware as a route layer and receive their claims via [`Authenticated`].
//!
//! Responsibilities:
//! - Build routes from [`Operation`] descriptors.
//! - Turn malformed JSON bodies into validation errors rather than axum's plain-text rejections.
//! - Wire configuration, the token issuer and the in-memory provider together at startup.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post, MethodRouter};
use axum::{middleware, Json, Router};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::identity::{require_bearer, AuthRequirement, Authenticated, Gate, TokenIssuer};
use crate::service::DirectoryService;
use crate::storage::{MemoryProvider, SharedProvider};
use crate::wire::{Empty, LoginRequest, LoginResponse, ReadSelfResponse, RegisterRequest, RegisterResponse, UpdateRequest};

mod operation;

pub use operation::Operation;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: DirectoryService,
    pub gate: Gate,
}

impl AppState {
    pub fn new(provider: SharedProvider, issuer: Arc<TokenIssuer>) -> Self {
        AppState { service: DirectoryService::new(provider, issuer.clone()), gate: Gate::new(issuer) }
    }
}

/// Body of a JSON request, with any parse failure reported as `{body:invalid}`.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(rej) => {
            debug!(target: "server", "request body rejected: {}", rej.body_text());
            Err(AppError::validation("{body:invalid}"))
        }
    }
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<RegisterResponse>> {
    let id = state.service.register(body(payload)?).await?;
    Ok(Json(RegisterResponse { user_id: id.get() }))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let token = state.service.login(body(payload)?).await?;
    Ok(Json(LoginResponse { token }))
}

async fn read_self(State(state): State<AppState>, Authenticated(claims): Authenticated) -> AppResult<Json<ReadSelfResponse>> {
    let user = state.service.read_self(&claims).await?;
    Ok(Json(ReadSelfResponse { user }))
}

async fn update_self(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> AppResult<Json<Empty>> {
    state.service.update_self(&claims, body(payload)?).await?;
    Ok(Json(Empty {}))
}

async fn delete_self(State(state): State<AppState>, Authenticated(claims): Authenticated) -> AppResult<Json<Empty>> {
    state.service.delete_self(&claims).await?;
    Ok(Json(Empty {}))
}

fn handler_for(op: Operation) -> MethodRouter<AppState> {
    match op {
        Operation::Register => post(register),
        Operation::Login => post(login),
        Operation::ReadSelf => post(read_self),
        Operation::UpdateSelf => post(update_self),
        Operation::DeleteSelf => post(delete_self),
    }
}

/// Router over all operations plus `GET /health`.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new().route("/health", get(|| async { "ok" }));
    for op in Operation::ALL {
        let mut route = handler_for(op);
        if op.auth() == AuthRequirement::Bearer {
            route = route.route_layer(middleware::from_fn_with_state(state.gate.clone(), require_bearer));
        }
        debug!(target: "server", operation = op.name(), path = op.path(), auth = ?op.auth(), "mounting operation");
        app = app.route(op.path(), route);
    }
    app.with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Start the directory HTTP server with the given configuration.
pub async fn run(config: Config) -> anyhow::Result<()> {
    use anyhow::Context;

    let issuer = Arc::new(TokenIssuer::new(config.secret.clone()));
    let provider: SharedProvider = Arc::new(MemoryProvider::new());
    let app = router(AppState::new(provider, issuer));

    let addr = config.bind_addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.context("serving http")?;
    info!("server stopped");
    Ok(())
}
