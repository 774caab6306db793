//! Request Gate & Policy Enforcement
//! Mission: Bind identity opportunistically, then enforce route rules

use crate::auth::identity::IdentityResolver;
use crate::auth::jwt::TokenService;
use crate::auth::models::Principal;
use crate::auth::policy::{AccessPolicy, AccessRule};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// State for the request gate.
#[derive(Clone)]
pub struct GateState {
    pub tokens: Arc<TokenService>,
    pub resolver: IdentityResolver,
}

/// Runs once per request, ahead of all handlers.
///
/// Extracts a bearer token if present, validates it, resolves the subject,
/// and binds the principal into request extensions. Every failure path
/// falls through to an anonymous request; enforcement happens later in the
/// access policy layer, never here.
pub async fn request_gate(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req) {
        match gate.tokens.validate(&token) {
            Ok(subject) => match gate.resolver.resolve(&subject) {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                }
                Err(e) => debug!(%subject, "Subject not resolvable, proceeding anonymous: {e}"),
            },
            Err(e) => debug!("Token rejected, proceeding anonymous: {e}"),
        }
    }

    next.run(req).await
}

/// `Authorization: Bearer <token>`, or nothing. A missing or differently
/// shaped header is not an error.
fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Evaluates the access policy against the principal bound by the gate.
pub async fn enforce_access_policy(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, AccessError> {
    let principal = req.extensions().get::<Principal>();

    match policy.decide(req.method(), req.uri().path()) {
        AccessRule::Public => {}
        AccessRule::AuthenticatedAny => {
            if principal.is_none() {
                return Err(AccessError::Unauthorized);
            }
        }
        AccessRule::RequiresCapability(capability) => match principal {
            None => return Err(AccessError::Unauthorized),
            Some(p) if !p.has_capability(capability) => return Err(AccessError::Forbidden),
            Some(_) => {}
        },
    }

    Ok(next.run(req).await)
}

/// Access policy outcomes surfaced to the client.
#[derive(Debug)]
pub enum AccessError {
    Unauthorized,
    Forbidden,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AccessError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AccessError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, message).into_response()
    }
}
