use std::fmt;
use std::str::FromStr;

use auth::Role;
use auth::Subject;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AccountIdError;
use crate::account::errors::EmailError;
use crate::account::errors::PasswordPolicyError;
use crate::account::errors::UsernameError;

/// Account aggregate entity.
///
/// `password_hash` holds the stored password record string, opaque to everything
/// except the authentication core.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account unique identifier type (database serial)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Parse an account ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not an integer
    pub fn from_string(s: &str) -> Result<Self, AccountIdError> {
        s.trim()
            .parse::<i64>()
            .map(AccountId)
            .map_err(|_| AccountIdError::InvalidFormat(s.to_string()))
    }

    /// Recover the account ID from a token subject.
    ///
    /// Tokens carry the numeric ID, but a decimal string subject is accepted too.
    ///
    /// # Errors
    /// * `InvalidFormat` - Subject is not an integer
    pub fn from_subject(subject: &Subject) -> Result<Self, AccountIdError> {
        match subject {
            Subject::Number(n) => Ok(AccountId(*n)),
            Subject::Text(s) => Self::from_string(s),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Surrounding whitespace is trimmed; the rest must be 1-100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MAX_LENGTH: usize = 100;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - Longer than 100 characters
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = username.trim().to_string();
        let length = username.chars().count();
        if length == 0 {
            Err(UsernameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(username))
        }
    }

    /// Wrap a username read back from the credential store, unchanged.
    pub fn from_trusted(username: String) -> Self {
        Self(username)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Trimmed and lowercased, then validated with an RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Wrap an email read back from the credential store, unchanged.
    pub fn from_trusted(email: String) -> Self {
        Self(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password accepted for a password set or change.
///
/// Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(String);

impl NewPassword {
    pub const MIN_LENGTH: usize = 8;

    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(***)")
    }
}

/// Account ready to be inserted; the store assigns the ID and timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
}

/// Account together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
    pub token: String,
}

/// Request metadata recorded with a login stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_addr: Option<String>,
    pub user_agent: Option<String>,
}

/// One recorded login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStamp {
    pub id: i64,
    pub ip_addr: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Number of login stamps returned by a listing, clamped to 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampLimit(i64);

impl StampLimit {
    pub const DEFAULT: i64 = 20;
    pub const MAX: i64 = 100;

    /// Parse a raw query value; anything unparseable falls back to the default.
    pub fn parse(raw: Option<&str>) -> Self {
        let requested = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n != 0)
            .unwrap_or(Self::DEFAULT);
        Self(requested.clamp(1, Self::MAX))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Default for StampLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(username: Username, email: EmailAddress, password: String) -> Self {
        Self {
            username,
            email,
            password,
        }
    }
}

/// Command to log in with either an email address or a username.
#[derive(Debug)]
pub struct LoginCommand {
    pub identifier: String,
    pub password: String,
}

/// Command to update the caller's own profile.
///
/// All fields are optional to support partial updates.
#[derive(Debug)]
pub struct UpdateProfileCommand {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
}

/// Command to change the caller's own password.
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: NewPassword,
}

/// Administrator account created at startup when none exists.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: Username,
    pub email: EmailAddress,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_is_trimmed_and_validated() {
        assert_eq!(Username::new("  ann_1 ".to_string()).unwrap().as_str(), "ann_1");
        assert_eq!(Username::new("Ann Lee".to_string()).unwrap().as_str(), "Ann Lee");
        assert_eq!(Username::new("jo".to_string()).unwrap().as_str(), "jo");
        assert_eq!(Username::new("   ".to_string()), Err(UsernameError::Empty));
        assert!(Username::new("x".repeat(100)).is_ok());
        assert!(matches!(
            Username::new("x".repeat(101)),
            Err(UsernameError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_trusted_values_are_kept_verbatim() {
        assert_eq!(Username::from_trusted(" a!".to_string()).as_str(), " a!");
        assert_eq!(
            EmailAddress::from_trusted("Ann@Example.com".to_string()).as_str(),
            "Ann@Example.com"
        );
    }

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::new(" Ann@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "ann@example.com");
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_account_id_from_subject() {
        assert_eq!(AccountId::from_subject(&Subject::Number(42)), Ok(AccountId(42)));
        assert_eq!(
            AccountId::from_subject(&Subject::Text("17".to_string())),
            Ok(AccountId(17))
        );
        assert!(AccountId::from_subject(&Subject::Text("abc".to_string())).is_err());
    }

    #[test]
    fn test_new_password_policy() {
        assert!(NewPassword::new("1234567".to_string()).is_err());
        assert!(NewPassword::new("12345678".to_string()).is_ok());
        assert_eq!(
            format!("{:?}", NewPassword::new("supersecret".to_string()).unwrap()),
            "NewPassword(***)"
        );
    }

    #[test]
    fn test_stamp_limit() {
        assert_eq!(StampLimit::parse(None).value(), 20);
        assert_eq!(StampLimit::parse(Some("5")).value(), 5);
        assert_eq!(StampLimit::parse(Some("500")).value(), 100);
        assert_eq!(StampLimit::parse(Some("-3")).value(), 1);
        assert_eq!(StampLimit::parse(Some("0")).value(), 20);
        assert_eq!(StampLimit::parse(Some("abc")).value(), 20);
    }
}
