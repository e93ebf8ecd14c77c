use std::sync::Arc;
use std::time::Duration;

use directory_service::config::Config;
use directory_service::domain::auth::service::AuthService;
use directory_service::domain::department::service::DepartmentService;
use directory_service::domain::user::service::UserService;
use directory_service::inbound::http::router::create_router;
use directory_service::outbound::mailer::SmtpMailer;
use directory_service::outbound::repositories::PostgresDepartmentRepository;
use directory_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "directory_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "directory-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        principal_ttl_seconds = config.cache.principal_ttl_seconds,
        jwt_expiration_hours = config.jwt.expiration_hours,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let department_repository = Arc::new(PostgresDepartmentRepository::new(pg_pool));
    let mailer = Arc::new(SmtpMailer::new(&config.mail)?);

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        config.jwt.secret.as_bytes(),
        config.jwt.action_secret.as_bytes(),
        chrono::Duration::hours(config.jwt.expiration_hours),
        Duration::from_secs(config.cache.principal_ttl_seconds),
    ));
    let user_service = Arc::new(UserService::new(
        user_repository,
        mailer,
        Arc::clone(&auth_service),
    ));
    let department_service = Arc::new(DepartmentService::new(department_repository));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(user_service, department_service, auth_service);
    axum::serve(http_listener, application).await?;

    Ok(())
}
