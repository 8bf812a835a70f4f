use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jb_storefront::api;
use jb_storefront::config::Config;
use jb_storefront::email::mailer::LogMailer;
use jb_storefront::email::templates::TemplateStore;
use jb_storefront::rate_limit::{self, RateLimiter};
use jb_storefront::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let rate_limiter = Arc::new(RateLimiter::new());
    let _sweeper = rate_limit::spawn_sweeper(Arc::clone(&rate_limiter), rate_limit::SWEEP_INTERVAL);

    let state = AppState {
        db,
        templates: Arc::new(TemplateStore::new(&config.templates_dir)),
        mailer: Arc::new(LogMailer),
        rate_limiter,
    };

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "jb-storefront listening");
    axum::serve(listener, app).await?;
    Ok(())
}
