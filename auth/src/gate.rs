use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::token::Claims;
use crate::token::Subject;
use crate::token::TokenCodec;

/// Access role carried in the `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name outside `user`/`admin`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Verified caller identity, rebuilt from token claims on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Subject,
    pub username: Option<String>,
    pub role: Option<Role>,
}

impl Identity {
    /// Build an identity from verified claims.
    ///
    /// Returns `None` when the claims carry no subject. A role name outside
    /// `user`/`admin` yields an identity without a role.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let id = claims.sub?;
        let role = claims.role.as_deref().and_then(|r| r.parse().ok());

        Some(Self {
            id,
            username: claims.username,
            role,
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// Outcomes visible at the request boundary.
///
/// Every token failure collapses into `Unauthenticated` so callers cannot tell
/// a bad signature from an expired or malformed token.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,
}

/// Turns an `Authorization` header value into a verified [`Identity`].
#[derive(Clone)]
pub struct AuthGate {
    codec: TokenCodec,
}

impl AuthGate {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// The value is split on whitespace and the second field is taken as the
    /// token. The first field is not checked against `Bearer`: any scheme word
    /// is accepted, matching the behavior existing clients rely on.
    ///
    /// # Errors
    /// * `Unauthenticated` - No token field, token fails verification, or token has no subject
    pub fn authenticate(&self, header_value: &str) -> Result<Identity, GateError> {
        let token = extract_token(header_value).ok_or(GateError::Unauthenticated)?;

        let claims = self.codec.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            GateError::Unauthenticated
        })?;

        Identity::from_claims(claims).ok_or_else(|| {
            tracing::debug!("Token carries no subject");
            GateError::Unauthenticated
        })
    }
}

/// Require the identity to hold `role`.
///
/// # Errors
/// * `Forbidden` - Identity has a different role or none
pub fn require_role(identity: &Identity, role: Role) -> Result<(), GateError> {
    if identity.has_role(role) {
        Ok(())
    } else {
        Err(GateError::Forbidden)
    }
}

fn extract_token(header_value: &str) -> Option<&str> {
    let mut fields = header_value.split_whitespace();
    fields.next()?;
    fields.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn gate() -> AuthGate {
        AuthGate::new(TokenCodec::new(SECRET))
    }

    #[test]
    fn test_authenticate_end_to_end() {
        let gate = gate();
        let token = gate
            .codec()
            .sign_with_ttl(&Claims::for_user(42, "ann", Role::User), 3600)
            .unwrap();

        let identity = gate
            .authenticate(&format!("Bearer {}", token))
            .expect("Authentication failed");

        assert_eq!(
            identity,
            Identity {
                id: Subject::Number(42),
                username: Some("ann".to_string()),
                role: Some(Role::User),
            }
        );

        assert_eq!(require_role(&identity, Role::Admin), Err(GateError::Forbidden));
        assert_eq!(require_role(&identity, Role::User), Ok(()));
    }

    #[test]
    fn test_admin_passes_role_gate() {
        let gate = gate();
        let token = gate
            .codec()
            .sign(&Claims::for_user("root", "root", Role::Admin))
            .unwrap();

        let identity = gate.authenticate(&format!("Bearer {}", token)).unwrap();
        assert_eq!(require_role(&identity, Role::Admin), Ok(()));
    }

    #[test]
    fn test_any_scheme_word_is_accepted() {
        let gate = gate();
        let token = gate.codec().sign(&Claims::new().with_subject(1)).unwrap();

        assert!(gate.authenticate(&format!("Token {}", token)).is_ok());
        assert!(gate.authenticate(&format!("bearer  {}", token)).is_ok());
    }

    #[test]
    fn test_missing_token_field() {
        let gate = gate();
        let token = gate.codec().sign(&Claims::new().with_subject(1)).unwrap();

        assert_eq!(gate.authenticate(""), Err(GateError::Unauthenticated));
        assert_eq!(gate.authenticate("Bearer"), Err(GateError::Unauthenticated));
        assert_eq!(gate.authenticate("Bearer "), Err(GateError::Unauthenticated));
        assert_eq!(gate.authenticate(&token), Err(GateError::Unauthenticated));
    }

    #[test]
    fn test_token_failures_collapse() {
        let gate = gate();
        let expired = gate
            .codec()
            .sign_with_ttl(&Claims::new().with_subject(1), -1)
            .unwrap();
        let foreign = TokenCodec::new(b"another_secret_key_at_least_32_bytes")
            .sign(&Claims::new().with_subject(1))
            .unwrap();

        for header in [
            format!("Bearer {}", expired),
            format!("Bearer {}", foreign),
            "Bearer not-a-token".to_string(),
            "Bearer a.b.c".to_string(),
        ] {
            assert_eq!(gate.authenticate(&header), Err(GateError::Unauthenticated));
        }
    }

    #[test]
    fn test_token_without_subject() {
        let gate = gate();
        let token = gate
            .codec()
            .sign(&Claims::new().with_username("ghost"))
            .unwrap();

        assert_eq!(
            gate.authenticate(&format!("Bearer {}", token)),
            Err(GateError::Unauthenticated)
        );
    }

    #[test]
    fn test_unknown_role_has_no_privileges() {
        let mut claims = Claims::new().with_subject(5);
        claims.role = Some("superuser".to_string());

        let identity = Identity::from_claims(claims).unwrap();
        assert_eq!(identity.role, None);
        assert_eq!(require_role(&identity, Role::User), Err(GateError::Forbidden));
        assert_eq!(require_role(&identity, Role::Admin), Err(GateError::Forbidden));
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert_eq!(
            "Admin".parse::<Role>(),
            Err(UnknownRole("Admin".to_string()))
        );
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
