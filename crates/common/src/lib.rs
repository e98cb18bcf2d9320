// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between user-service clients and the server.
//! This module defines the JSON request/response bodies and the identifiers
//! shared by every layer.

use serde::{Deserialize, Serialize};

/// Numeric user identifier
pub type UserId = u32;

/// Per-user mutation counter; starts at 0, grows by one on every write
pub type Version = u64;

/// Registration payload
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserIn {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Partial profile update; empty fields are left untouched
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Password change payload
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Login payload
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register, login and password change
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
}

/// Public view of a user. Never carries the credential or the version.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body of `GET /users`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListUsersResponse {
    pub users: Vec<UserView>,
}

/// Error body returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_in_uses_camel_case() {
        let user: UserIn = serde_json::from_str(
            r#"{"email":"a@b.io","password":"Abcdef1!","firstName":"Ada","lastName":"King"}"#,
        )
        .unwrap();
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "King");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let user: UserIn = serde_json::from_str(r#"{"email":"a@b.io"}"#).unwrap();
        assert!(user.password.is_empty());
        assert!(user.first_name.is_empty());

        let update: UserUpdate = serde_json::from_str(r#"{"lastName":"Byron"}"#).unwrap();
        assert!(update.first_name.is_empty());
        assert_eq!(update.last_name, "Byron");
    }

    #[test]
    fn test_login_response_shape() {
        let body = serde_json::to_value(LoginResponse {
            token: "t".to_string(),
            user_id: 7,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"token": "t", "userId": 7}));
    }
}
