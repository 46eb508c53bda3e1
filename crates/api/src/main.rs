use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workhub_api::{build_router, state::AppState};
use workhub_config::Settings;
use workhub_db::{connect, indexes::ensure_indexes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "workhub_api=debug,workhub_services=debug,workhub_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting Workhub API on {}:{}", settings.app.host, settings.app.port);
    info!(
        database = %settings.database.name,
        transactions = settings.database.use_transactions,
        smtp = settings.smtp.is_configured(),
        ai = settings.ai.api_key.is_some(),
        "Runtime configuration"
    );

    let (client, db) = connect(&settings).await?;
    ensure_indexes(&db).await?;

    let app_state = AppState::new(client, db, settings.clone())?;
    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
