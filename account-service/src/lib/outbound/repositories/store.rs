use async_trait::async_trait;

use super::account::PostgresAccountRepository;
use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::ClientInfo;
use crate::account::models::EmailAddress;
use crate::account::models::LoginStamp;
use crate::account::models::NewAccount;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

/// Credential store chosen once at startup.
///
/// Without a configured database every operation fails with
/// `AccountError::NotConfigured`, which the HTTP layer reports as 503.
pub enum AccountStore {
    Postgres(PostgresAccountRepository),
    Unconfigured,
}

impl AccountStore {
    pub fn is_configured(&self) -> bool {
        matches!(self, AccountStore::Postgres(_))
    }

    fn repository(&self) -> Result<&PostgresAccountRepository, AccountError> {
        match self {
            AccountStore::Postgres(repository) => Ok(repository),
            AccountStore::Unconfigured => Err(AccountError::NotConfigured),
        }
    }
}

#[async_trait]
impl AccountRepository for AccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        self.repository()?.create(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        self.repository()?.find_by_id(id).await
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<Account>, AccountError> {
        self.repository()?.find_by_login(identifier).await
    }

    async fn exists_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<bool, AccountError> {
        self.repository()?
            .exists_by_email_or_username(email, username)
            .await
    }

    async fn find_conflicting(
        &self,
        exclude: &AccountId,
        email: Option<EmailAddress>,
        username: Option<Username>,
    ) -> Result<bool, AccountError> {
        self.repository()?
            .find_conflicting(exclude, email, username)
            .await
    }

    async fn update(&self, account: Account) -> Result<Account, AccountError> {
        self.repository()?.update(account).await
    }

    async fn delete(&self, id: &AccountId) -> Result<bool, AccountError> {
        self.repository()?.delete(id).await
    }

    async fn list_admins(&self) -> Result<Vec<Account>, AccountError> {
        self.repository()?.list_admins().await
    }

    async fn has_admin(&self) -> Result<bool, AccountError> {
        self.repository()?.has_admin().await
    }

    async fn record_login(&self, id: &AccountId, client: &ClientInfo) -> Result<(), AccountError> {
        self.repository()?.record_login(id, client).await
    }

    async fn list_login_stamps(
        &self,
        id: &AccountId,
        limit: i64,
    ) -> Result<Vec<LoginStamp>, AccountError> {
        self.repository()?.list_login_stamps(id, limit).await
    }
}
