//! Credential persistence contract

use async_trait::async_trait;
use tubeshelf_db::Database;

use crate::credential::{CredentialRecord, NewCredential};
use crate::error::AuthError;

/// Persistence collaborator for credential records
///
/// Implementations own their own concurrency discipline; the core only
/// reads through `lookup` and writes through `create`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential for an identity
    async fn lookup(&self, identity: &str) -> Result<Option<CredentialRecord>, AuthError>;

    /// Persist a new credential with a fresh salt and an empty role
    async fn create(&self, credential: NewCredential) -> Result<CredentialRecord, AuthError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn lookup(&self, identity: &str) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self
            .get_user_by_username(identity)
            .await?
            .map(CredentialRecord::from))
    }

    async fn create(&self, credential: NewCredential) -> Result<CredentialRecord, AuthError> {
        // Derivation is CPU-bound; keep it off the async workers
        let row = tokio::task::spawn_blocking(move || credential.seal())
            .await
            .map_err(|e| AuthError::Derivation(format!("derivation task failed: {}", e)))??;

        let user = self.insert_user(row).await?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::verify;
    use tubeshelf_db::DbError;

    #[tokio::test]
    async fn test_create_then_lookup() {
        let db = Database::in_memory().await.unwrap();

        let created = db
            .create(NewCredential::new("u1", "User One", "hunter2").unwrap())
            .await
            .unwrap();
        assert_eq!(created.username, "u1");
        assert_eq!(created.role, "");
        assert!(!created.salt.contains("hunter2"));
        assert!(!created.hash.contains("hunter2"));

        let found = db.lookup("u1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.salt, created.salt);
        assert_eq!(found.hash, created.hash);

        assert!(verify(&found, "hunter2"));
        assert!(!verify(&found, "hunter3"));
    }

    #[tokio::test]
    async fn test_lookup_unknown_identity() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.lookup("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_store_error() {
        let db = Database::in_memory().await.unwrap();
        db.create(NewCredential::new("u1", "", "hunter2").unwrap()).await.unwrap();

        let err = db
            .create(NewCredential::new("u1", "", "other").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(DbError::Duplicate(_))));
    }
}
