//! Identity Resolver
//! Mission: Turn a validated token subject into a request-scoped principal

use crate::auth::account_store::AccountStore;
use crate::auth::models::Principal;
use std::sync::Arc;

/// Why a subject could not be resolved.
///
/// `AccountNotFound` covers the deleted-account case: a still-unexpired
/// token whose subject no longer exists fails here, not at signature
/// verification. The request gate treats both variants like an invalid
/// token and proceeds anonymous.
#[derive(Debug)]
pub enum ResolveError {
    AccountNotFound,
    Store(anyhow::Error),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::AccountNotFound => write!(f, "account not found"),
            ResolveError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolves a token subject against the credential store.
#[derive(Clone)]
pub struct IdentityResolver {
    accounts: Arc<AccountStore>,
}

impl IdentityResolver {
    pub fn new(accounts: Arc<AccountStore>) -> Self {
        Self { accounts }
    }

    /// One store lookup per request; principals are never cached across
    /// requests.
    pub fn resolve(&self, subject: &str) -> Result<Principal, ResolveError> {
        let account = self
            .accounts
            .find_by_username(subject)
            .map_err(ResolveError::Store)?
            .ok_or(ResolveError::AccountNotFound)?;

        Ok(Principal::from_account(&account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn resolver_with_store() -> (IdentityResolver, Arc<AccountStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(AccountStore::new(temp_file.path().to_str().unwrap()).unwrap());
        (IdentityResolver::new(store.clone()), store, temp_file)
    }

    #[test]
    fn test_resolve_carries_roles() {
        let (resolver, store, _temp) = resolver_with_store();
        store
            .create_account("Alice", "alice", "alice@example.com", "password123", "ROLE_ADMIN")
            .unwrap();

        let principal = resolver.resolve("alice").unwrap();
        assert_eq!(principal.username, "alice");
        assert!(principal.has_capability("ROLE_ADMIN"));
    }

    #[test]
    fn test_unknown_subject_not_found() {
        let (resolver, _store, _temp) = resolver_with_store();
        assert!(matches!(
            resolver.resolve("ghost"),
            Err(ResolveError::AccountNotFound)
        ));
    }

    #[test]
    fn test_deleted_account_invalidates_subject() {
        let (resolver, store, _temp) = resolver_with_store();
        store
            .create_account("Alice", "alice", "alice@example.com", "password123", "ROLE_ADMIN")
            .unwrap();
        assert!(resolver.resolve("alice").is_ok());

        store.delete_by_username("alice").unwrap();
        assert!(matches!(
            resolver.resolve("alice"),
            Err(ResolveError::AccountNotFound)
        ));
    }
}
