use std::sync::Arc;

use shop_api::{
    auth::TokenService,
    config::Config,
    create_router, db,
    notify::{Dispatcher, LogNotifier, Notifier, SmtpNotifier},
    AppState, Stores,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shop_api=info,tower_http=info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Shop API - Starting...");

    let config = Config::from_env()?;

    let stores = match config.database_url.as_deref() {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url).await?;
            db::run_migrations(&pool).await?;
            Stores::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; data is kept in memory and lost on restart");
            Stores::memory()
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => {
            tracing::info!("Sending email through {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpNotifier::new(smtp)?)
        }
        None => {
            tracing::warn!("SMTP not configured; emails are logged instead of sent");
            Arc::new(LogNotifier)
        }
    };
    let dispatcher = Dispatcher::new(notifier, config.mail_timeout);

    let state = AppState::new(stores, TokenService::new(&config.jwt_secret), dispatcher);

    if let Some(seed) = &config.admin {
        state.auth_service.bootstrap_admin(seed).await?;
    }

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Shop API is running on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
