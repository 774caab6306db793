//! Authentication API Endpoints
//! Mission: Provide login and signup endpoints

use crate::auth::account_store::{AccountStore, InsertError};
use crate::auth::jwt::TokenService;
use crate::auth::models::{LoginRequest, LoginResponse, SignupRequest};
use crate::auth::throttle::LoginThrottle;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<AccountStore>,
    pub tokens: Arc<TokenService>,
    pub throttle: Arc<LoginThrottle>,
    pub default_signup_role: String,
}

/// Login endpoint - POST /api/v1/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let handle = payload.username_or_email.trim();
    if handle.is_empty() || payload.password.is_empty() {
        return Err(AuthApiError::InvalidCredentials);
    }

    if !state.throttle.check(handle) {
        warn!(handle, "Login throttled");
        return Err(AuthApiError::TooManyAttempts);
    }

    // One response shape for unknown accounts and wrong passwords, so the
    // endpoint cannot be used for account enumeration.
    let account = match state
        .accounts
        .authenticate(handle, &payload.password)
        .map_err(|e| {
            warn!("Login lookup failed: {e}");
            AuthApiError::InternalError
        })? {
        Some(account) => account,
        None => {
            state.throttle.record_failure(handle);
            return Err(AuthApiError::InvalidCredentials);
        }
    };

    state.throttle.clear(handle);

    let token = state.tokens.issue(&account.username).map_err(|e| {
        warn!("Token issuance failed: {e}");
        AuthApiError::InternalError
    })?;

    info!(username = %account.username, "Login successful");

    Ok(Json(LoginResponse::bearer(token)))
}

/// Signup endpoint - POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, &'static str), AuthApiError> {
    validate_signup(&payload)?;

    // Fast-path checks; the UNIQUE constraints below remain the true guard
    // against concurrent duplicates.
    if state
        .accounts
        .username_exists(&payload.username)
        .map_err(|_| AuthApiError::InternalError)?
    {
        return Err(AuthApiError::UsernameTaken);
    }
    if state
        .accounts
        .email_exists(&payload.email)
        .map_err(|_| AuthApiError::InternalError)?
    {
        return Err(AuthApiError::EmailTaken);
    }

    let account = state
        .accounts
        .create_account(
            &payload.name,
            &payload.username,
            &payload.email,
            &payload.password,
            &state.default_signup_role,
        )
        .map_err(|e| match e {
            InsertError::UsernameTaken => AuthApiError::UsernameTaken,
            InsertError::EmailTaken => AuthApiError::EmailTaken,
            InsertError::Other(err) => {
                warn!("Signup failed: {err}");
                AuthApiError::InternalError
            }
        })?;

    info!(username = %account.username, role = %state.default_signup_role, "Account registered");

    Ok((StatusCode::OK, "User registered successfully!"))
}

fn validate_signup(payload: &SignupRequest) -> Result<(), AuthApiError> {
    if payload.name.trim().is_empty()
        || payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AuthApiError::MissingField);
    }

    let email = payload.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AuthApiError::InvalidEmail);
    }

    Ok(())
}

/// Auth API errors
#[derive(Debug, PartialEq, Eq)]
pub enum AuthApiError {
    InvalidCredentials,
    TooManyAttempts,
    UsernameTaken,
    EmailTaken,
    MissingField,
    InvalidEmail,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed login attempts. Try again later.",
            ),
            AuthApiError::UsernameTaken => (StatusCode::BAD_REQUEST, "Username is already taken!"),
            AuthApiError::EmailTaken => (StatusCode::BAD_REQUEST, "Email is already taken!"),
            AuthApiError::MissingField => (
                StatusCode::BAD_REQUEST,
                "Name, username, email and password are required",
            ),
            AuthApiError::InvalidEmail => (StatusCode::BAD_REQUEST, "Email address is not valid"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_payload() -> SignupRequest {
        SignupRequest {
            name: "Alice".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        }
    }

    #[test]
    fn test_validate_signup_accepts_well_formed() {
        assert!(validate_signup(&signup_payload()).is_ok());
    }

    #[test]
    fn test_validate_signup_rejects_blank_fields() {
        let mut payload = signup_payload();
        payload.username = "  ".to_string();
        assert_eq!(validate_signup(&payload), Err(AuthApiError::MissingField));
    }

    #[test]
    fn test_validate_signup_rejects_bad_email() {
        let mut payload = signup_payload();
        payload.email = "not-an-email".to_string();
        assert_eq!(validate_signup(&payload), Err(AuthApiError::InvalidEmail));

        payload.email = "@example.com".to_string();
        assert_eq!(validate_signup(&payload), Err(AuthApiError::InvalidEmail));
    }

    #[test]
    fn test_validate_signup_rejects_empty_password() {
        let mut payload = signup_payload();
        payload.password = String::new();
        assert_eq!(validate_signup(&payload), Err(AuthApiError::MissingField));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            AuthApiError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthApiError::UsernameTaken.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthApiError::EmailTaken.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthApiError::TooManyAttempts.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
