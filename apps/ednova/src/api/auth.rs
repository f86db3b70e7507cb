//! # Identity Gateway
//!
//! Credential storage and bearer-token authentication for the EdNova HTTP
//! API.
//!
//! The gateway lives entirely in the binary: the core never sees emails,
//! secrets, or tokens, only resolved `UserId`s. Secrets are compared in
//! constant time; tokens are opaque UUID strings minted at login and
//! revoked at logout.
//!
//! ## Usage
//!
//! Send the session token in the Authorization header:
//! ```text
//! Authorization: Bearer <token>
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use ednova_core::{EdnovaError, User, UserId};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;
use uuid::Uuid;

// =============================================================================
// CONSTANT-TIME SECRET COMPARISON
// =============================================================================

/// Compare two secrets in constant time.
///
/// Pad both values to the same length so `ct_eq` always runs over the same
/// number of bytes, preventing length-leaking side channels.
fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

// =============================================================================
// LOCAL GATEWAY
// =============================================================================

/// One stored credential set.
#[derive(Debug, Clone)]
struct Account {
    secret: String,
    user: UserId,
}

/// In-memory credential and token store.
///
/// Credentials are keyed by email; active tokens map back to the user they
/// were minted for. Volatile by design: a restart logs everyone out while
/// the registry's records persist.
#[derive(Debug, Default)]
pub struct LocalGateway {
    accounts: BTreeMap<String, Account>,
    tokens: BTreeMap<String, UserId>,
}

impl LocalGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store credentials for a registered user. Emails are unique.
    pub fn register(
        &mut self,
        email: &str,
        secret: &str,
        user: UserId,
    ) -> Result<(), EdnovaError> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(EdnovaError::Auth("Invalid email address".to_string()));
        }
        if secret.len() < 8 {
            return Err(EdnovaError::Auth(
                "Secret must be at least 8 characters".to_string(),
            ));
        }
        if self.accounts.contains_key(&email) {
            return Err(EdnovaError::Auth("Email already registered".to_string()));
        }
        self.accounts.insert(
            email,
            Account {
                secret: secret.to_string(),
                user,
            },
        );
        Ok(())
    }

    /// Remove a stored credential again. Returns whether it existed.
    ///
    /// Used to roll back a registration whose user record failed to land,
    /// so the email stays available for a retry.
    pub fn unregister(&mut self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        self.accounts.remove(&email).is_some()
    }

    /// Verify credentials and mint a fresh bearer token.
    pub fn authenticate(&mut self, email: &str, secret: &str) -> Result<String, EdnovaError> {
        let email = email.trim().to_ascii_lowercase();
        let Some(account) = self.accounts.get(&email) else {
            tracing::warn!(
                event = "auth_failure",
                reason = "unknown_email",
                "Authentication failed"
            );
            return Err(EdnovaError::Auth("Invalid credentials".to_string()));
        };
        if !secrets_match(secret, &account.secret) {
            tracing::warn!(
                event = "auth_failure",
                reason = "bad_secret",
                "Authentication failed"
            );
            return Err(EdnovaError::Auth("Invalid credentials".to_string()));
        }
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), account.user);
        Ok(token)
    }

    /// Resolve an active token to its user.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).copied()
    }

    /// Revoke a token. Returns whether it was active.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

// =============================================================================
// BEARER AUTH MIDDLEWARE
// =============================================================================

/// Bearer-token authentication middleware for the protected routes.
///
/// Resolves the token to a registered [`User`] and injects it as a request
/// extension; handlers read the authenticated principal from there.
pub async fn bearer_auth_middleware(
    State(state): State<super::AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(header_value) = auth_header else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    // Support both "Bearer <token>" and raw "<token>" formats
    let token = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

    let user_id = {
        let gateway = state.gateway.read().await;
        gateway.resolve(token)
    };
    let Some(user_id) = user_id else {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_token",
            "Authentication failed: unknown or revoked token"
        );
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    let user: Option<User> = {
        let registry = state.registry.read().await;
        registry.user(user_id).ok().flatten()
    };
    let Some(user) = user else {
        // Token outlived the record; treat as revoked.
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u128) -> UserId {
        UserId::from_u128(n)
    }

    #[test]
    fn register_validates_email_and_secret() {
        let mut gateway = LocalGateway::new();
        assert!(gateway.register("not-an-email", "longenough", user(1)).is_err());
        assert!(gateway.register("a@b.example", "short", user(1)).is_err());
        assert_eq!(gateway.account_count(), 0);
        assert!(gateway.register("a@b.example", "longenough", user(1)).is_ok());
        // Emails are case-insensitive unique.
        assert!(gateway.register("A@B.example", "longenough", user(2)).is_err());
        assert_eq!(gateway.account_count(), 1);
    }

    #[test]
    fn unregister_frees_the_email() {
        let mut gateway = LocalGateway::new();
        gateway.register("a@b.example", "longenough", user(1)).unwrap();

        assert!(gateway.unregister("A@B.example"));
        assert!(!gateway.unregister("a@b.example"));
        assert_eq!(gateway.account_count(), 0);
        assert!(gateway.authenticate("a@b.example", "longenough").is_err());

        // The email is available again.
        assert!(gateway.register("a@b.example", "longenough", user(2)).is_ok());
    }

    #[test]
    fn authenticate_mints_and_revoke_kills_tokens() {
        let mut gateway = LocalGateway::new();
        gateway.register("a@b.example", "longenough", user(1)).unwrap();

        assert!(gateway.authenticate("a@b.example", "wrong-secret").is_err());
        let token = gateway.authenticate("a@b.example", "longenough").unwrap();
        assert_eq!(gateway.resolve(&token), Some(user(1)));

        assert!(gateway.revoke(&token));
        assert!(!gateway.revoke(&token));
        assert_eq!(gateway.resolve(&token), None);
    }

    #[test]
    fn secrets_match_is_exact() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
        assert!(!secrets_match("", "abc"));
    }
}
