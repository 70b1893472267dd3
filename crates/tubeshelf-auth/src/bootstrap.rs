//! First-start administrator provisioning

use tracing::debug;
use tubeshelf_db::Database;

use crate::credential::{CredentialRecord, NewCredential};
use crate::error::AuthError;

/// Role claim carried by the bootstrap administrator
pub const ADMIN_ROLE: &str = "admin";

/// Create the first administrator when the store holds no credentials.
///
/// The admin row is written with its role in a single insert that only
/// succeeds on an empty table. Returns `None` when users already exist.
pub async fn bootstrap_admin(
    db: &Database,
    credential: NewCredential,
) -> Result<Option<CredentialRecord>, AuthError> {
    if db.has_users().await? {
        debug!("Users exist; skipping bootstrap admin");
        return Ok(None);
    }

    let row = tokio::task::spawn_blocking(move || credential.seal_with_role(ADMIN_ROLE))
        .await
        .map_err(|e| AuthError::Derivation(format!("derivation task failed: {}", e)))??;

    Ok(db.insert_first_user(row).await?.map(CredentialRecord::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CredentialStore;
    use crate::verifier::verify;

    #[tokio::test]
    async fn test_bootstrap_on_empty_store() {
        let db = Database::in_memory().await.unwrap();

        let admin = bootstrap_admin(&db, NewCredential::new("root", "Root", "pw").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, ADMIN_ROLE);

        let stored = db.lookup("root").await.unwrap().unwrap();
        assert_eq!(stored.role, ADMIN_ROLE);
        assert!(verify(&stored, "pw"));
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_when_users_exist() {
        let db = Database::in_memory().await.unwrap();
        db.create(NewCredential::new("u1", "", "pw").unwrap())
            .await
            .unwrap();

        let result = bootstrap_admin(&db, NewCredential::new("root", "", "pw").unwrap())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(db.lookup("root").await.unwrap().is_none());
        assert_eq!(db.lookup("u1").await.unwrap().unwrap().role, "");
    }
}
