//! Application Configuration
//! Mission: Load all runtime settings once at startup, immutable afterwards

use anyhow::{ensure, Result};
use std::path::PathBuf;

/// Process-wide configuration, constructed once in `main` and shared by
/// reference. The signing secret and token validity never change after
/// startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub blog_db_path: String,
    pub auth_db_path: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub default_signup_role: String,
    pub login_max_failures: u32,
    pub login_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let blog_db_path = resolve_data_path(std::env::var("DATABASE_PATH").ok(), "blog.db");
        let auth_db_path = resolve_data_path(std::env::var("AUTH_DB_PATH").ok(), "blog_auth.db");

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());
        ensure!(!jwt_secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt_expiration_secs = std::env::var("JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(86_400);

        let default_signup_role = std::env::var("DEFAULT_SIGNUP_ROLE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "ROLE_ADMIN".to_string());

        let login_max_failures = std::env::var("LOGIN_MAX_FAILURES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(10);

        let login_window_secs = std::env::var("LOGIN_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(300);

        Ok(Self {
            port,
            blog_db_path,
            auth_db_path,
            jwt_secret,
            jwt_expiration_secs,
            default_signup_role,
            login_max_failures,
            login_window_secs,
        })
    }
}

fn default_data_path(filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    base.join(filename).to_string_lossy().to_string()
}

/// Relative paths are anchored at the crate directory, not the caller's cwd.
fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return default_data_path(default_filename);
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_path_absolute_passthrough() {
        let resolved = resolve_data_path(Some("/tmp/auth.db".to_string()), "fallback.db");
        assert_eq!(resolved, "/tmp/auth.db");
    }

    #[test]
    fn test_resolve_data_path_empty_falls_back() {
        let resolved = resolve_data_path(Some("  ".to_string()), "fallback.db");
        assert!(resolved.ends_with("fallback.db"));
    }

    #[test]
    fn test_resolve_data_path_relative_is_anchored() {
        let resolved = resolve_data_path(Some("data/auth.db".to_string()), "fallback.db");
        assert!(resolved.ends_with("data/auth.db"));
        assert!(PathBuf::from(&resolved).is_absolute());
    }
}
