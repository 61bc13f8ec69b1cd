use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::ClientInfo;
use crate::account::models::EmailAddress;
use crate::account::models::LoginStamp;
use crate::account::models::NewAccount;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(Account {
            id: AccountId(row.id),
            username: Username::from_trusted(row.username),
            email: EmailAddress::from_trusted(row.email),
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LoginStampRow {
    id: i64,
    ip_addr: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LoginStampRow> for LoginStamp {
    fn from(row: LoginStampRow) -> Self {
        LoginStamp {
            id: row.id,
            ip_addr: row.ip_addr,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

/// Translate a write failure, reporting unique violations as conflicts.
fn map_write_error(e: sqlx::Error, conflict_message: &str) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            tracing::debug!(
                constraint = db_err.constraint().unwrap_or("unknown"),
                "Unique constraint violated"
            );
            return AccountError::AlreadyExists(conflict_message.to_string());
        }
    }
    AccountError::DatabaseError(e.to_string())
}

fn map_read_error(e: sqlx::Error) -> AccountError {
    AccountError::DatabaseError(e.to_string())
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "User already exists"))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_read_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM users
            WHERE lower(email) = lower($1) OR username = $1
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_read_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn exists_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<bool, AccountError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users WHERE lower(email) = $1 OR username = $2
            )
            "#,
        )
        .bind(email.as_str())
        .bind(username.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_read_error)
    }

    async fn find_conflicting(
        &self,
        exclude: &AccountId,
        email: Option<EmailAddress>,
        username: Option<Username>,
    ) -> Result<bool, AccountError> {
        // AND binds tighter than OR: an email match is not filtered by id.
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE (lower(email) = $1::text AND $1::text IS NOT NULL)
                   OR (username = $2::text AND $2::text IS NOT NULL)
                  AND id <> $3
            )
            "#,
        )
        .bind(email.as_ref().map(|e| e.as_str()))
        .bind(username.as_ref().map(|u| u.as_str()))
        .bind(exclude.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_read_error)
    }

    async fn update(&self, account: Account) -> Result<Account, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Username or email already in use"))?;

        row.ok_or(AccountError::NotFound(account.id.to_string()))?
            .try_into()
    }

    async fn delete(&self, id: &AccountId) -> Result<bool, AccountError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_admins(&self) -> Result<Vec<Account>, AccountError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM users
            WHERE role = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(Role::Admin.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_read_error)?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn has_admin(&self) -> Result<bool, AccountError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
            .bind(Role::Admin.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_read_error)
    }

    async fn record_login(&self, id: &AccountId, client: &ClientInfo) -> Result<(), AccountError> {
        sqlx::query(
            r#"
            INSERT INTO login_stamps (user_id, ip_addr, user_agent)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id.0)
        .bind(client.ip_addr.as_deref())
        .bind(client.user_agent.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn list_login_stamps(
        &self,
        id: &AccountId,
        limit: i64,
    ) -> Result<Vec<LoginStamp>, AccountError> {
        let rows = sqlx::query_as::<_, LoginStampRow>(
            r#"
            SELECT id, ip_addr, user_agent, created_at
            FROM login_stamps
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_read_error)?;

        Ok(rows.into_iter().map(LoginStamp::from).collect())
    }
}
