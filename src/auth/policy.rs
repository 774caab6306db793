//! Access Policy
//! Mission: Declarative route security as an ordered, testable rule table

use axum::http::Method;

/// Capability required for destructive routes in the baseline policy.
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// What a matched route requires of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Allowed regardless of bound principal.
    Public,
    /// Requires any bound principal.
    AuthenticatedAny,
    /// Requires a bound principal holding the named capability.
    RequiresCapability(String),
}

/// One (method, path pattern) -> rule entry.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// `None` matches every method.
    method: Option<Method>,
    /// Exact path, or a prefix pattern ending in `/*`.
    pattern: String,
    rule: AccessRule,
}

impl PolicyRule {
    pub fn new(method: Option<Method>, pattern: &str, rule: AccessRule) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            rule,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(m) = &self.method {
            if m != method {
                return false;
            }
        }

        match self.pattern.strip_suffix("/*") {
            Some(prefix) => {
                path == prefix || (path.starts_with(prefix) && path[prefix.len()..].starts_with('/'))
            }
            None => path == self.pattern,
        }
    }
}

/// Ordered rule table, evaluated top-to-bottom, first match wins.
/// Unmatched requests fall through to the default rule.
pub struct AccessPolicy {
    rules: Vec<PolicyRule>,
    default_rule: AccessRule,
}

impl AccessPolicy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self {
            rules,
            default_rule: AccessRule::AuthenticatedAny,
        }
    }

    /// The fixed baseline for this system: auth endpoints and reads are
    /// public, deletes need the admin capability, every other mutation
    /// needs a logged-in caller.
    pub fn baseline(admin_role: &str) -> Self {
        Self::new(vec![
            PolicyRule::new(Some(Method::POST), "/api/v1/auth/*", AccessRule::Public),
            PolicyRule::new(Some(Method::GET), "/health", AccessRule::Public),
            PolicyRule::new(Some(Method::GET), "/api/v1/*", AccessRule::Public),
            PolicyRule::new(
                Some(Method::DELETE),
                "/api/v1/*",
                AccessRule::RequiresCapability(admin_role.to_string()),
            ),
        ])
    }

    pub fn decide(&self, method: &Method, path: &str) -> &AccessRule {
        self.rules
            .iter()
            .find(|r| r.matches(method, path))
            .map(|r| &r.rule)
            .unwrap_or(&self.default_rule)
    }
}
