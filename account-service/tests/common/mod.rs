use std::net::SocketAddr;
use std::sync::Arc;

use account_service::account::errors::AccountError;
use account_service::account::models::Account;
use account_service::account::models::AccountId;
use account_service::account::models::AdminSeed;
use account_service::account::models::AuthenticatedAccount;
use account_service::account::models::ChangePasswordCommand;
use account_service::account::models::ClientInfo;
use account_service::account::models::EmailAddress;
use account_service::account::models::LoginCommand;
use account_service::account::models::LoginStamp;
use account_service::account::models::NewPassword;
use account_service::account::models::RegisterCommand;
use account_service::account::models::StampLimit;
use account_service::account::models::UpdateProfileCommand;
use account_service::account::models::Username;
use account_service::account::ports::AccountServicePort;
use account_service::account::service::AccountService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::repositories::AccountStore;
use async_trait::async_trait;
use auth::Authenticator;
use auth::Claims;
use auth::PasswordHasher;
use auth::Role;
use auth::TokenCodec;
use chrono::Utc;
use mockall::mock;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-token-signing-at-least-32-bytes";
pub const USER_AGENT: &str = "account-service-api-tests";

mock! {
    pub AccountService {}

    #[async_trait]
    impl AccountServicePort for AccountService {
        async fn register(&self, command: RegisterCommand, client: ClientInfo) -> Result<AuthenticatedAccount, AccountError>;
        async fn login(&self, command: LoginCommand, client: ClientInfo) -> Result<AuthenticatedAccount, AccountError>;
        async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError>;
        async fn update_profile(&self, id: &AccountId, command: UpdateProfileCommand) -> Result<Account, AccountError>;
        async fn change_password(&self, id: &AccountId, command: ChangePasswordCommand) -> Result<(), AccountError>;
        async fn set_password(&self, id: &AccountId, password: NewPassword) -> Result<Account, AccountError>;
        async fn list_admins(&self) -> Result<Vec<Account>, AccountError>;
        async fn delete_account(&self, id: &AccountId) -> Result<(), AccountError>;
        async fn list_login_stamps(&self, id: &AccountId, limit: StampLimit) -> Result<Vec<LoginStamp>, AccountError>;
        async fn ensure_admin(&self, seed: AdminSeed) -> Result<bool, AccountError>;
    }
}

/// Test application that spawns a real server in front of a given account service
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub authenticator: Authenticator,
}

impl TestApp {
    /// Spawn the router over a mocked account service.
    pub async fn spawn(service: MockAccountService) -> Self {
        Self::spawn_with(Arc::new(service)).await
    }

    /// Spawn the router over the real service with no credential store configured.
    pub async fn spawn_unconfigured() -> Self {
        let service = AccountService::new(Arc::new(AccountStore::Unconfigured), Arc::new(authenticator()));
        Self::spawn_with(Arc::new(service)).await
    }

    async fn spawn_with(service: Arc<dyn AccountServicePort>) -> Self {
        let authenticator = authenticator();
        let gate = Arc::new(authenticator.gate().clone());

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let application = create_router(service, gate);
        tokio::spawn(async move {
            axum::serve(
                listener,
                application.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server failed");
        });

        let api_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build client");

        Self {
            address,
            api_client,
            authenticator,
        }
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.patch(format!("{}{}", self.address, path))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(format!("{}{}", self.address, path))
    }

    /// Bearer token for an account with the given ID and role.
    pub fn token_for(&self, id: i64, role: Role) -> String {
        self.authenticator
            .issue_token(&Claims::for_user(id, "ann", role))
            .expect("Failed to issue token")
    }

    pub fn bearer(&self, id: i64, role: Role) -> String {
        format!("Bearer {}", self.token_for(id, role))
    }
}

fn authenticator() -> Authenticator {
    Authenticator::from_parts(
        PasswordHasher::with_iterations(1_000),
        TokenCodec::new(TEST_SECRET),
    )
}

pub fn sample_account(id: i64, role: Role) -> Account {
    Account {
        id: AccountId(id),
        username: Username::new("ann".to_string()).unwrap(),
        email: EmailAddress::new("ann@example.com".to_string()).unwrap(),
        password_hash: "pbkdf2$1000$00ff$00ff".to_string(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
