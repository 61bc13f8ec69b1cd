use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Claims;
use auth::Role;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AdminSeed;
use crate::account::models::AuthenticatedAccount;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::ClientInfo;
use crate::account::models::LoginCommand;
use crate::account::models::LoginStamp;
use crate::account::models::NewAccount;
use crate::account::models::NewPassword;
use crate::account::models::RegisterCommand;
use crate::account::models::StampLimit;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;

/// Password given to the seed administrator when none is configured.
pub const FALLBACK_ADMIN_PASSWORD: &str = "ChangeMe123!";

/// Domain service implementation for account operations.
///
/// Password hashing and verification run on the blocking thread pool; no
/// repository call is awaited while a derivation is in flight.
pub struct AccountService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    authenticator: Arc<Authenticator>,
}

impl<AR> AccountService<AR>
where
    AR: AccountRepository,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store implementation
    /// * `authenticator` - Password hasher and token issuer
    pub fn new(repository: Arc<AR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);
        let record = tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AccountError::Unknown(format!("Password hashing task failed: {}", e)))??;
        Ok(record.to_string())
    }

    async fn verify_password(&self, password: String, stored: String) -> Result<bool, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &stored))
            .await
            .map_err(|e| AccountError::Unknown(format!("Password verification task failed: {}", e)))
    }

    fn issue_token(&self, account: &Account) -> Result<String, AccountError> {
        let claims = Claims::for_user(account.id.0, account.username.as_str(), account.role);
        Ok(self.authenticator.issue_token(&claims)?)
    }

    async fn record_login(&self, account: &Account, client: &ClientInfo) {
        if let Err(e) = self.repository.record_login(&account.id, client).await {
            tracing::warn!(
                account_id = %account.id,
                error = %e,
                "Failed to record login stamp"
            );
        }
    }

    async fn require_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl<AR> AccountServicePort for AccountService<AR>
where
    AR: AccountRepository,
{
    async fn register(
        &self,
        command: RegisterCommand,
        client: ClientInfo,
    ) -> Result<AuthenticatedAccount, AccountError> {
        if self
            .repository
            .exists_by_email_or_username(&command.email, &command.username)
            .await?
        {
            return Err(AccountError::AlreadyExists("User already exists".to_string()));
        }

        let password_hash = self.hash_password(command.password).await?;

        let account = self
            .repository
            .create(NewAccount {
                username: command.username,
                email: command.email,
                password_hash,
                role: Role::User,
            })
            .await?;

        let token = self.issue_token(&account)?;
        self.record_login(&account, &client).await;

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(AuthenticatedAccount { account, token })
    }

    async fn login(
        &self,
        command: LoginCommand,
        client: ClientInfo,
    ) -> Result<AuthenticatedAccount, AccountError> {
        let identifier = command.identifier.trim();

        let account = self
            .repository
            .find_by_login(identifier)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let stored = account.password_hash.clone();
        let claims = Claims::for_user(account.id.0, account.username.as_str(), account.role);
        let authenticated = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored, &claims)
        })
        .await
        .map_err(|e| AccountError::Unknown(format!("Password verification task failed: {}", e)))?;

        let token = match authenticated {
            Ok(result) => result.access_token,
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::debug!(account_id = %account.id, "Password mismatch on login");
                return Err(AccountError::InvalidCredentials);
            }
            Err(AuthenticationError::PasswordError(e)) => return Err(e.into()),
            Err(AuthenticationError::TokenError(e)) => return Err(e.into()),
        };
        self.record_login(&account, &client).await;

        Ok(AuthenticatedAccount { account, token })
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.require_account(id).await
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError> {
        if command.username.is_none() && command.email.is_none() {
            return Err(AccountError::NothingToUpdate);
        }

        if self
            .repository
            .find_conflicting(id, command.email.clone(), command.username.clone())
            .await?
        {
            return Err(AccountError::AlreadyExists(
                "Username or email already in use".to_string(),
            ));
        }

        let mut account = self.require_account(id).await?;

        if let Some(new_username) = command.username {
            account.username = new_username;
        }

        if let Some(new_email) = command.email {
            account.email = new_email;
        }

        self.repository.update(account).await
    }

    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError> {
        let mut account = self.require_account(id).await?;

        let valid = self
            .verify_password(command.current_password, account.password_hash.clone())
            .await?;
        if !valid {
            return Err(AccountError::IncorrectPassword);
        }

        account.password_hash = self
            .hash_password(command.new_password.into_inner())
            .await?;
        self.repository.update(account).await?;

        tracing::info!(account_id = %id, "Password changed");

        Ok(())
    }

    async fn set_password(
        &self,
        id: &AccountId,
        password: NewPassword,
    ) -> Result<Account, AccountError> {
        let mut account = self.require_account(id).await?;

        account.password_hash = self.hash_password(password.into_inner()).await?;
        let account = self.repository.update(account).await?;

        tracing::info!(account_id = %id, "Password set by administrator");

        Ok(account)
    }

    async fn list_admins(&self) -> Result<Vec<Account>, AccountError> {
        self.repository.list_admins().await
    }

    async fn delete_account(&self, id: &AccountId) -> Result<(), AccountError> {
        if !self.repository.delete(id).await? {
            return Err(AccountError::NotFound(id.to_string()));
        }

        tracing::info!(account_id = %id, "Account deleted");

        Ok(())
    }

    async fn list_login_stamps(
        &self,
        id: &AccountId,
        limit: StampLimit,
    ) -> Result<Vec<LoginStamp>, AccountError> {
        self.repository.list_login_stamps(id, limit.value()).await
    }

    async fn ensure_admin(&self, seed: AdminSeed) -> Result<bool, AccountError> {
        if self.repository.has_admin().await? {
            return Ok(false);
        }

        let configured = seed
            .password
            .filter(|p| p.chars().count() >= NewPassword::MIN_LENGTH);
        let uses_fallback = configured.is_none();
        let password = configured.unwrap_or_else(|| FALLBACK_ADMIN_PASSWORD.to_string());

        let password_hash = self.hash_password(password).await?;

        let created = self
            .repository
            .create(NewAccount {
                username: seed.username,
                email: seed.email,
                password_hash,
                role: Role::Admin,
            })
            .await;

        match created {
            Ok(account) => {
                if uses_fallback {
                    tracing::warn!(
                        email = %account.email.as_str(),
                        "Seeded admin account with the default password; change it"
                    );
                } else {
                    tracing::info!(email = %account.email.as_str(), "Seeded admin account");
                }
                Ok(true)
            }
            Err(AccountError::AlreadyExists(_)) => {
                tracing::warn!(
                    "Admin seed collides with an existing account; create an admin manually"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
