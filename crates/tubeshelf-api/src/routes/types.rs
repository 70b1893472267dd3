//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use tubeshelf_auth::CredentialRecord;
use tubeshelf_db::User;

// ==================== Auth Types ====================

/// Credential presentation in a request body
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ==================== User Types ====================

/// Create user request
///
/// Has no salt, hash or role fields; anything else the client
/// sends is dropped during deserialization.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
}

/// Update user request
///
/// Only the display name can change; role, salt and hash in the body are
/// ignored.
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
}

/// User response (without salt or hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: String,
}

impl From<CredentialRecord> for UserResponse {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            name: record.name,
            role: record.role,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
        }
    }
}
