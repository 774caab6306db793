//! Authentication Models
//! Mission: Define account, principal, and token claim data structures

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A registered account, owned by the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub roles: HashSet<String>,
    pub created_at: String,
}

/// Request-scoped identity resolved from a validated token.
///
/// Built once per request by the identity resolver and carried in request
/// extensions; never shared across requests.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub roles: HashSet<String>,
}

impl Principal {
    pub fn from_account(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            roles: account.roles.clone(),
        }
    }

    pub fn has_capability(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (username)
    pub iat: i64,    // issued-at timestamp
    pub exp: i64,    // expiration timestamp
}

/// Login request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String, // always "Bearer"
}

impl LoginResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Signup request body
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}
