//! User credential operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        // Check if user already exists
        let existing = self.get_user_by_username(&user.username).await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!("User '{}' already exists", user.username)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, name, salt, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.salt)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // A concurrent insert can still win the race after the check above
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DbError::Duplicate(format!("User '{}' already exists", user.username))
            }
            other => DbError::Connection(other),
        })?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            username: user.username,
            name: user.name,
            salt: user.salt,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, username, name, salt, password_hash, role, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, username, name, salt, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, name, salt, password_hash, role, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update user display name
    pub async fn update_user_name(&self, id: i64, name: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user
    pub async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert a user only while the table is still empty
    ///
    /// The emptiness check and the insert are one statement, so a first user
    /// is either written whole or not at all. Returns `None` when users
    /// already exist.
    pub async fn insert_first_user(&self, user: NewUser) -> Result<Option<User>, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, name, salt, password_hash, role, created_at, updated_at)
            SELECT ?, ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM users)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.salt)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.map(|row| User {
            id: row.get("id"),
            username: user.username,
            name: user.name,
            salt: user.salt,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        }))
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            name: "Test User".to_string(),
            salt: "c2FsdA==".to_string(),
            password_hash: "aGFzaA==".to_string(),
            role: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_user() {
        let db = Database::in_memory().await.unwrap();
        assert!(!db.has_users().await.unwrap());

        let user = db.insert_user(new_user("andrew")).await.unwrap();
        assert!(db.has_users().await.unwrap());

        let by_name = db.get_user_by_username("andrew").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.name, "Test User");
        assert_eq!(by_name.salt, "c2FsdA==");
        assert_eq!(by_name.password_hash, "aGFzaA==");
        assert_eq!(by_name.role, "");

        let by_id = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "andrew");

        assert!(db.get_user_by_username("joy").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::in_memory().await.unwrap();
        db.insert_user(new_user("andrew")).await.unwrap();

        let err = db.insert_user(new_user("andrew")).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_list_rename_and_delete() {
        let db = Database::in_memory().await.unwrap();
        let first = db.insert_user(new_user("andrew")).await.unwrap();
        let second = db.insert_user(new_user("joy")).await.unwrap();

        let users = db.list_users().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["andrew", "joy"]);

        assert!(db.update_user_name(first.id, "Andrew K").await.unwrap());
        let renamed = db.get_user_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(renamed.name, "Andrew K");
        assert_eq!(renamed.password_hash, first.password_hash);
        assert!(!db.update_user_name(second.id + 100, "x").await.unwrap());

        assert!(db.delete_user(second.id).await.unwrap());
        assert!(!db.delete_user(second.id).await.unwrap());
        assert!(db.get_user_by_id(second.id).await.unwrap().is_none());
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_first_user_only_on_empty_table() {
        let db = Database::in_memory().await.unwrap();

        let mut admin = new_user("root");
        admin.role = "admin".to_string();
        let created = db.insert_first_user(admin).await.unwrap().unwrap();
        assert_eq!(created.role, "admin");

        let stored = db.get_user_by_username("root").await.unwrap().unwrap();
        assert_eq!(stored.id, created.id);
        assert_eq!(stored.role, "admin");

        assert!(db.insert_first_user(new_user("late")).await.unwrap().is_none());
        assert!(db.get_user_by_username("late").await.unwrap().is_none());
    }

    #[test]
    fn test_user_serialization_hides_credentials() {
        let now = Utc::now();
        let user = User {
            id: 1,
            username: "andrew".to_string(),
            name: "Andrew".to_string(),
            salt: "c2FsdA==".to_string(),
            password_hash: "aGFzaA==".to_string(),
            role: String::new(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("andrew"));
        assert!(!json.contains("c2FsdA=="));
        assert!(!json.contains("aGFzaA=="));
    }
}
