//! Login orchestration: lookup, verify, issue

use std::sync::Arc;

use tracing::debug;

use crate::credential::{CredentialRecord, NewCredential};
use crate::error::AuthError;
use crate::store::CredentialStore;
use crate::token::{AuthConfig, IdentityContext, Token, TokenAuthenticator, TokenIssuer};
use crate::verifier::verify;

/// Authentication entry point shared by request handlers
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    authenticator: TokenAuthenticator,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            issuer: TokenIssuer::new(config),
            authenticator: TokenAuthenticator::new(config),
        }
    }

    /// Verify credentials and mint a token.
    ///
    /// Unknown identities and wrong secrets both yield
    /// [`AuthError::VerificationFailed`] after the same derivation work.
    pub async fn login(&self, identity: &str, secret: &str) -> Result<Token, AuthError> {
        let found = self.store.lookup(identity).await?;
        let known = found.is_some();
        let record = found.unwrap_or_else(CredentialRecord::decoy);

        let candidate = record.clone();
        let secret = secret.to_owned();
        let matched = tokio::task::spawn_blocking(move || verify(&candidate, &secret))
            .await
            .unwrap_or(false);

        if !(known && matched) {
            debug!("Credential verification failed");
            return Err(AuthError::VerificationFailed);
        }

        let identity = IdentityContext::try_from(&record)?;
        self.issuer.issue(&identity)
    }

    /// Create a credential from a sanitized request
    pub async fn register(&self, credential: NewCredential) -> Result<CredentialRecord, AuthError> {
        self.store.create(credential).await
    }

    /// Resolve the caller identity from a presented token
    pub fn authenticate(&self, token: impl AsRef<[u8]>) -> Result<IdentityContext, AuthError> {
        self.authenticator.authenticate(token)
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::json;
    use tubeshelf_db::Database;

    async fn service() -> AuthService {
        let db = Database::in_memory().await.unwrap();
        AuthService::new(Arc::new(db), &AuthConfig::new("test-secret-key").unwrap())
    }

    #[tokio::test]
    async fn test_end_to_end_login() {
        let service = service().await;
        let record = service
            .register(NewCredential::new("u1", "User One", "hunter2").unwrap())
            .await
            .unwrap();

        assert!(verify(&record, "hunter2"));
        assert!(!verify(&record, "hunter3"));

        let token = service.login("u1", "hunter2").await.unwrap();
        let identity = service.authenticate(token.as_str()).unwrap();

        assert_eq!(identity.id, record.id as u64);
        assert_eq!(identity.username, "u1");
        assert_eq!(identity.name, "User One");
        assert_eq!(identity.role, "");
    }

    #[tokio::test]
    async fn test_wrong_secret_and_unknown_user_look_the_same() {
        let service = service().await;
        service
            .register(NewCredential::new("u1", "User One", "hunter2").unwrap())
            .await
            .unwrap();

        let wrong = service.login("u1", "hunter3").await.unwrap_err();
        let unknown = service.login("joy", "hunter2").await.unwrap_err();

        assert!(matches!(wrong, AuthError::VerificationFailed));
        assert!(matches!(unknown, AuthError::VerificationFailed));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_role_reflected_in_token() {
        let db = Database::in_memory().await.unwrap();
        let service = AuthService::new(
            Arc::new(db.clone()),
            &AuthConfig::new("test-secret-key").unwrap(),
        );
        crate::bootstrap::bootstrap_admin(
            &db,
            NewCredential::new("root", "Root", "correct-horse").unwrap(),
        )
        .await
        .unwrap();

        let token = service.login("root", "correct-horse").await.unwrap();
        assert_eq!(service.authenticate(token.as_str()).unwrap().role, "admin");
    }

    #[tokio::test]
    async fn test_forged_role_rejected() {
        let service = service().await;
        let record = service
            .register(NewCredential::new("u1", "", "hunter2").unwrap())
            .await
            .unwrap();

        let token = service.login("u1", "hunter2").await.unwrap();
        let parts: Vec<&str> = token.as_str().split('.').collect();
        let forged_claims = json!({
            "id": record.id, "name": "", "username": "u1", "role": "admin",
            "nbf": crate::token::FIXED_NOT_BEFORE,
        });
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(forged_claims.to_string()),
            parts[2]
        );

        assert!(matches!(service.authenticate(&forged), Err(AuthError::Invalid)));
    }
}
