use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::gate::Role;

/// Subject identifier carried in the `sub` claim.
///
/// Accounts issued from a numeric primary key keep the number on the wire,
/// anything else is an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Number(i64),
    Text(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Number(n) => n.fmt(f),
            Subject::Text(s) => s.fmt(f),
        }
    }
}

impl From<i64> for Subject {
    fn from(value: i64) -> Self {
        Subject::Number(value)
    }
}

impl From<i32> for Subject {
    fn from(value: i32) -> Self {
        Subject::Number(i64::from(value))
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Subject::Text(value.to_string())
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Subject::Text(value)
    }
}

/// Identity claims carried by a token.
///
/// `iat` and `exp` are stamped by the codec at signing time. Keys other than
/// the ones modelled here are kept in `extra` and survive a sign/verify round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Claims {
    /// Subject (account identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<Subject>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Role name, `user` or `admin` for tokens issued by this crate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the claims issued to an account at login or registration.
    ///
    /// # Arguments
    /// * `sub` - Account identifier
    /// * `username` - Account username
    /// * `role` - Account role
    pub fn for_user(sub: impl Into<Subject>, username: impl ToString, role: Role) -> Self {
        Self::new()
            .with_subject(sub)
            .with_username(username)
            .with_role(role)
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set username.
    pub fn with_username(mut self, username: impl ToString) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Set role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role.as_str().to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(false, |exp| current_timestamp > exp)
    }
}
