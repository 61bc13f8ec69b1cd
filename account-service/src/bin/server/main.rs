use std::net::SocketAddr;
use std::sync::Arc;

use account_service::account::models::AdminSeed;
use account_service::account::models::EmailAddress;
use account_service::account::models::Username;
use account_service::account::ports::AccountServicePort;
use account_service::account::service::AccountService;
use account_service::config::Config;
use account_service::inbound::http::router::create_router;
use account_service::outbound::repositories::AccountStore;
use account_service::outbound::repositories::PostgresAccountRepository;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenCodec;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,auth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        database_configured = config.database.url.is_some(),
        token_ttl_seconds = config.token.ttl_seconds,
        password_iterations = config.password.iterations,
        "Configuration loaded"
    );

    if config.token.uses_dev_secret() {
        tracing::warn!("TOKEN__SECRET is not set; signing tokens with the development secret");
    }

    let store = match config.database.url.as_deref() {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            AccountStore::Postgres(PostgresAccountRepository::new(pg_pool))
        }
        None => {
            tracing::warn!("DATABASE__URL is not set; account routes will answer 503");
            AccountStore::Unconfigured
        }
    };
    let store_configured = store.is_configured();

    let authenticator = Arc::new(Authenticator::from_parts(
        PasswordHasher::with_iterations(config.password.iterations),
        TokenCodec::with_ttl(
            config.token.secret_or_default().as_bytes(),
            config.token.ttl_seconds,
        ),
    ));
    let gate = Arc::new(authenticator.gate().clone());

    let account_service = Arc::new(AccountService::new(
        Arc::new(store),
        Arc::clone(&authenticator),
    ));

    if store_configured {
        let seed = AdminSeed {
            username: Username::new(config.admin.username.clone())?,
            email: EmailAddress::new(config.admin.email.clone())?,
            password: config.admin.password.clone(),
        };
        match account_service.ensure_admin(seed).await {
            Ok(true) => tracing::info!("Admin account created"),
            Ok(false) => tracing::debug!("Admin account already present"),
            Err(e) => tracing::error!(error = %e, "Failed to seed admin account"),
        }
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(account_service, gate);

    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    tracing::info!("Server exited");

    Ok(())
}
