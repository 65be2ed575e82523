//!
//! userdir directory service
//! --------------------------
//! Orchestrates the five directory operations over a [`Provider`]. Input is
//! decoded before storage is touched, storage and token failures are translated
//! into [`AppError`], and gated operations take their subject from verified
//! [`Claims`] only.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::decode::{decode_login, decode_register, decode_update};
use crate::error::{AppError, AppResult};
use crate::identity::{Claims, TokenIssuer};
use crate::model::{UserId, UserView};
use crate::security;
use crate::storage::{SharedProvider, StorageError};
use crate::wire::{LoginRequest, RegisterRequest, UpdateRequest};

#[derive(Clone)]
pub struct DirectoryService {
    provider: SharedProvider,
    issuer: Arc<TokenIssuer>,
}

/// Subject of a verified token. A token we signed without a usable subject is our fault.
fn subject_of(claims: &Claims) -> AppResult<UserId> {
    claims.subject().map_err(|e| {
        error!(target: "service", "verified claims carry no usable subject: {}", e);
        AppError::internal()
    })
}

fn hash(password: &str) -> AppResult<String> {
    security::hash_password(password).map_err(|e| {
        error!(target: "service", "password hashing failed: {e}");
        AppError::internal()
    })
}

impl DirectoryService {
    pub fn new(provider: SharedProvider, issuer: Arc<TokenIssuer>) -> Self {
        Self { provider, issuer }
    }

    pub fn issuer(&self) -> &Arc<TokenIssuer> { &self.issuer }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<UserId> {
        let mut user = decode_register(req)?;
        user.password = hash(&user.password)?;
        let id = self.provider.create(user).await.map_err(|e| {
            if let StorageError::Duplicate { field } = &e {
                debug!(target: "service", "register refused: duplicate {}", field);
            }
            AppError::from(e)
        })?;
        info!(target: "service", user_id = %id, "user registered");
        Ok(id)
    }

    /// Returns a signed bearer token for the user owning `email`.
    pub async fn login(&self, req: LoginRequest) -> AppResult<String> {
        let creds = decode_login(req)?;
        let user = self.provider.find_by_email(&creds.email).await?;
        if !security::verify_password(&user.password_hash, &creds.password) {
            debug!(target: "service", user_id = %user.id, "login refused: password mismatch");
            return Err(AppError::password_invalid());
        }
        let token = self.issuer.issue(&Claims::for_subject(user.id))?;
        debug!(target: "service", user_id = %user.id, "token issued");
        Ok(token)
    }

    pub async fn read_self(&self, claims: &Claims) -> AppResult<UserView> {
        let id = subject_of(claims)?;
        let user = self.provider.find_by_id(id).await?;
        Ok(UserView::from(&user))
    }

    pub async fn update_self(&self, claims: &Claims, req: UpdateRequest) -> AppResult<()> {
        let id = subject_of(claims)?;
        let mut update = decode_update(req, id)?;
        let stored = self.provider.find_by_id(id).await?;
        if let Some(plain) = update.password.take() {
            update.password = Some(hash(&plain)?);
        }
        let merged = stored.merge(&update)?;
        self.provider.update(&merged).await?;
        info!(target: "service", user_id = %id, "user updated");
        Ok(())
    }

    pub async fn delete_self(&self, claims: &Claims) -> AppResult<()> {
        let id = subject_of(claims)?;
        self.provider.remove_by_id(id).await?;
        info!(target: "service", user_id = %id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SigningSecret;
    use crate::storage::MemoryProvider;
    use chrono::{Duration, Utc};

    fn service() -> DirectoryService {
        let issuer = Arc::new(TokenIssuer::new(SigningSecret::new("service-secret").unwrap()));
        DirectoryService::new(Arc::new(MemoryProvider::new()), issuer)
    }

    fn register_req(login: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            login: login.into(),
            first_name: "Eva".into(),
            last_name: None,
            email: email.into(),
            password: "pw".into(),
            created_at: Some(Utc::now() - Duration::minutes(1)),
        }
    }

    async fn login_claims(svc: &DirectoryService, email: &str) -> Claims {
        let token = svc.login(LoginRequest { email: email.into(), password: "pw".into() }).await.unwrap();
        svc.issuer().verify(&token).unwrap()
    }

    #[tokio::test]
    async fn register_login_read() {
        let svc = service();
        let id = svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        assert_eq!(id.get(), 1);
        let claims = login_claims(&svc, "a@b.com").await;
        assert_eq!(claims.subject().unwrap(), id);
        let view = svc.read_self(&claims).await.unwrap();
        assert_eq!(view.login, "ekvo");
        assert_eq!(view.email, "a@b.com");
    }

    #[tokio::test]
    async fn invalid_register_never_reaches_storage() {
        let svc = service();
        let err = svc.register(RegisterRequest::default()).await.unwrap_err();
        assert_eq!(
            err,
            AppError::validation("{created-at:invalid},{email:invalid},{first-name:empty},{login:empty},{password:empty}")
        );
        let err = svc.login(LoginRequest { email: "a@b.com".into(), password: "pw".into() }).await.unwrap_err();
        assert_eq!(err, AppError::not_found());
    }

    #[tokio::test]
    async fn duplicate_register_is_already_exists() {
        let svc = service();
        svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        assert_eq!(svc.register(register_req("other", "a@b.com")).await, Err(AppError::already_exists()));
        assert_eq!(svc.register(register_req("ekvo", "c@b.com")).await, Err(AppError::already_exists()));
    }

    #[tokio::test]
    async fn login_failures() {
        let svc = service();
        svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        let wrong = svc.login(LoginRequest { email: "a@b.com".into(), password: "nope".into() }).await;
        assert_eq!(wrong, Err(AppError::password_invalid()));
        let unknown = svc.login(LoginRequest { email: "x@b.com".into(), password: "pw".into() }).await;
        assert_eq!(unknown, Err(AppError::not_found()));
        let malformed = svc.login(LoginRequest { email: "not-an-email".into(), password: String::new() }).await;
        assert_eq!(malformed, Err(AppError::validation("{email:invalid},{password:empty}")));
    }

    #[tokio::test]
    async fn update_changes_fields_and_password() {
        let svc = service();
        svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        let claims = login_claims(&svc, "a@b.com").await;
        let req = UpdateRequest {
            first_name: Some("  Evelyn ".into()),
            password: Some("new-pw".into()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        svc.update_self(&claims, req).await.unwrap();
        let view = svc.read_self(&claims).await.unwrap();
        assert_eq!(view.first_name, "Evelyn");
        assert!(view.updated_at.is_some());
        assert!(svc.login(LoginRequest { email: "a@b.com".into(), password: "new-pw".into() }).await.is_ok());
        assert_eq!(
            svc.login(LoginRequest { email: "a@b.com".into(), password: "pw".into() }).await,
            Err(AppError::password_invalid())
        );
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let svc = service();
        svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        let claims = login_claims(&svc, "a@b.com").await;
        let first = Utc::now();
        let req = |at| UpdateRequest { updated_at: Some(at), ..Default::default() };
        svc.update_self(&claims, req(first)).await.unwrap();
        assert_eq!(svc.update_self(&claims, req(first)).await, Err(AppError::update_conflict()));
        assert_eq!(
            svc.update_self(&claims, req(first - Duration::seconds(1))).await,
            Err(AppError::update_conflict())
        );
    }

    #[tokio::test]
    async fn update_before_creation_conflicts() {
        let svc = service();
        svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        let claims = login_claims(&svc, "a@b.com").await;
        let req = UpdateRequest { updated_at: Some(Utc::now() - Duration::hours(1)), ..Default::default() };
        assert_eq!(svc.update_self(&claims, req).await, Err(AppError::update_conflict()));
    }

    #[tokio::test]
    async fn delete_then_everything_is_not_found() {
        let svc = service();
        svc.register(register_req("ekvo", "a@b.com")).await.unwrap();
        let claims = login_claims(&svc, "a@b.com").await;
        svc.delete_self(&claims).await.unwrap();
        assert_eq!(svc.read_self(&claims).await, Err(AppError::not_found()));
        assert_eq!(svc.delete_self(&claims).await, Err(AppError::not_found()));
        let req = UpdateRequest { updated_at: Some(Utc::now()), ..Default::default() };
        assert_eq!(svc.update_self(&claims, req).await, Err(AppError::not_found()));
    }

    #[tokio::test]
    async fn claims_without_subject_are_internal() {
        let svc = service();
        let mut claims = Claims::new();
        claims.insert("role", "admin");
        assert_eq!(svc.read_self(&claims).await, Err(AppError::internal()));
        let mut claims = Claims::new();
        claims.insert(crate::identity::SUBJECT_CLAIM, "0");
        assert_eq!(svc.delete_self(&claims).await, Err(AppError::internal()));
    }
}
