//! Session tokens: issue at login, check on every protected request,
//! revoke at logout through the deny-list.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{claims::SessionClaims, jwt::JwtKeys};
use crate::{
    error::AppError,
    store::{Store, StoreError},
};

/// Pulls the token out of an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

pub struct SessionAuthenticator {
    keys: JwtKeys,
    store: Arc<dyn Store>,
}

impl SessionAuthenticator {
    pub fn new(keys: JwtKeys, store: Arc<dyn Store>) -> Self {
        Self { keys, store }
    }

    /// Call only after the credentials were verified.
    pub fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        self.keys
            .sign(user_id, email)
            .map_err(|e| AppError::Internal(format!("jwt sign failed: {e}")))
    }

    /// Deny-list first, then signature and expiry.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<SessionClaims, AppError> {
        let token = bearer_token(header).ok_or(AppError::MissingToken)?;
        if self.store.is_token_revoked(token).await? {
            warn!("revoked token presented");
            return Err(AppError::TokenRevoked);
        }
        self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::InvalidToken
        })
    }

    /// Records the raw token string. A second revoke of the same string is a conflict.
    pub async fn revoke(&self, header: Option<&str>) -> Result<(), AppError> {
        let token = bearer_token(header).ok_or(AppError::MissingToken)?;
        match self.store.revoke_token(token).await {
            Ok(()) => {
                info!("token revoked");
                Ok(())
            }
            Err(StoreError::AlreadyExists) => Err(AppError::AlreadyRevoked),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::JwtConfig, store::MemoryStore};
    use jsonwebtoken::Algorithm;

    fn authenticator(ttl_minutes: i64) -> SessionAuthenticator {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_minutes,
            algorithm: Algorithm::HS256,
        });
        SessionAuthenticator::new(keys, Arc::new(MemoryStore::new()))
    }

    fn header(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("bearer abc ")), Some("abc"));
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[tokio::test]
    async fn issued_token_authenticates_with_matching_claims() {
        let auth = authenticator(48 * 60);
        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id, "alice@example.com").unwrap();
        let claims = auth.authenticate(Some(&header(&token))).await.unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn missing_header_is_missing_token() {
        let auth = authenticator(60);
        assert!(matches!(auth.authenticate(None).await, Err(AppError::MissingToken)));
        assert!(matches!(auth.revoke(Some("Token x")).await, Err(AppError::MissingToken)));
    }

    #[tokio::test]
    async fn garbage_and_expired_tokens_are_invalid() {
        let auth = authenticator(60);
        assert!(matches!(
            auth.authenticate(Some("Bearer nope")).await,
            Err(AppError::InvalidToken)
        ));

        let expired = authenticator(-120);
        let token = expired.issue_token(Uuid::new_v4(), "a@example.com").unwrap();
        assert!(matches!(
            expired.authenticate(Some(&header(&token))).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn revoked_token_reports_revoked_not_invalid() {
        let auth = authenticator(60);
        let token = auth.issue_token(Uuid::new_v4(), "a@example.com").unwrap();
        auth.revoke(Some(&header(&token))).await.unwrap();
        assert!(matches!(
            auth.authenticate(Some(&header(&token))).await,
            Err(AppError::TokenRevoked)
        ));
        // garbage that was revoked is also reported as revoked
        auth.revoke(Some("Bearer garbage")).await.unwrap();
        assert!(matches!(
            auth.authenticate(Some("Bearer garbage")).await,
            Err(AppError::TokenRevoked)
        ));
    }

    #[tokio::test]
    async fn revoking_one_session_leaves_others_valid() {
        let auth = authenticator(60);
        let user_id = Uuid::new_v4();
        let laptop = auth.issue_token(user_id, "a@example.com").unwrap();
        let phone = auth.issue_token(user_id, "a@example.com").unwrap();
        auth.revoke(Some(&header(&laptop))).await.unwrap();
        assert!(auth.authenticate(Some(&header(&phone))).await.is_ok());
    }

    #[tokio::test]
    async fn double_revoke_is_a_conflict() {
        let auth = authenticator(60);
        let token = auth.issue_token(Uuid::new_v4(), "a@example.com").unwrap();
        auth.revoke(Some(&header(&token))).await.unwrap();
        assert!(matches!(
            auth.revoke(Some(&header(&token))).await,
            Err(AppError::AlreadyRevoked)
        ));
    }
}
