use async_trait::async_trait;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AdminSeed;
use crate::account::models::AuthenticatedAccount;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::ClientInfo;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::LoginStamp;
use crate::account::models::NewAccount;
use crate::account::models::NewPassword;
use crate::account::models::RegisterCommand;
use crate::account::models::StampLimit;
use crate::account::models::UpdateProfileCommand;
use crate::account::models::Username;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new `user` account and issue its first token.
    ///
    /// # Errors
    /// * `AlreadyExists` - Email or username is taken
    /// * `NotConfigured` - No credential store is configured
    /// * `DatabaseError` - Database operation failed
    async fn register(
        &self,
        command: RegisterCommand,
        client: ClientInfo,
    ) -> Result<AuthenticatedAccount, AccountError>;

    /// Verify credentials and issue a token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown account or wrong password
    /// * `NotConfigured` - No credential store is configured
    /// * `DatabaseError` - Database operation failed
    async fn login(
        &self,
        command: LoginCommand,
        client: ClientInfo,
    ) -> Result<AuthenticatedAccount, AccountError>;

    /// Retrieve account by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError>;

    /// Update username and/or email of an account.
    ///
    /// # Errors
    /// * `NothingToUpdate` - Neither field given
    /// * `AlreadyExists` - Username or email already in use
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError>;

    /// Replace the caller's password after checking the current one.
    ///
    /// # Errors
    /// * `IncorrectPassword` - Current password does not verify
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Database operation failed
    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError>;

    /// Replace any account's password without checking the old one.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Database operation failed
    async fn set_password(
        &self,
        id: &AccountId,
        password: NewPassword,
    ) -> Result<Account, AccountError>;

    /// List every admin account, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_admins(&self) -> Result<Vec<Account>, AccountError>;

    /// Delete an account together with its login stamps.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete_account(&self, id: &AccountId) -> Result<(), AccountError>;

    /// List the most recent login stamps of an account, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_login_stamps(
        &self,
        id: &AccountId,
        limit: StampLimit,
    ) -> Result<Vec<LoginStamp>, AccountError>;

    /// Create the seed administrator when no admin account exists.
    ///
    /// # Returns
    /// True when an administrator was created
    ///
    /// # Errors
    /// * `NotConfigured` - No credential store is configured
    /// * `DatabaseError` - Database operation failed
    async fn ensure_admin(&self, seed: AdminSeed) -> Result<bool, AccountError>;
}

/// Persistence operations for the account aggregate (the credential store).
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist new account and return it with its assigned ID.
    ///
    /// # Errors
    /// * `AlreadyExists` - Username or email is taken
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError>;

    /// Retrieve account by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Retrieve account whose lowercased email equals the lowercased identifier,
    /// or whose username equals the identifier exactly.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_login(&self, identifier: &str) -> Result<Option<Account>, AccountError>;

    /// Check whether any account uses this email or username.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn exists_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<bool, AccountError>;

    /// Check whether a profile update would collide with another account.
    ///
    /// Evaluates `(email matches) OR (username matches AND id <> exclude)`; an
    /// email match is reported even when it is the caller's own address.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_conflicting(
        &self,
        exclude: &AccountId,
        email: Option<EmailAddress>,
        username: Option<Username>,
    ) -> Result<bool, AccountError>;

    /// Update username, email and password record of an existing account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `AlreadyExists` - New username or email is taken
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, account: Account) -> Result<Account, AccountError>;

    /// Delete an account; login stamps cascade.
    ///
    /// # Returns
    /// False when no account had this ID
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &AccountId) -> Result<bool, AccountError>;

    /// List accounts with the `admin` role, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_admins(&self) -> Result<Vec<Account>, AccountError>;

    /// Check whether at least one admin account exists.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn has_admin(&self) -> Result<bool, AccountError>;

    /// Append a login stamp for the account.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn record_login(&self, id: &AccountId, client: &ClientInfo) -> Result<(), AccountError>;

    /// List login stamps, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_login_stamps(
        &self,
        id: &AccountId,
        limit: i64,
    ) -> Result<Vec<LoginStamp>, AccountError>;
}
