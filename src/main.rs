use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liftplan::config::Config;
use liftplan::handlers::{plans, sessions};
use liftplan::repositories::{AuthTokenRepository, PlanRepository};
use liftplan::{db, migrations, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liftplan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database: {}", config.database_url);

    let pool = db::create_pool(&config.database_url, config.db_pool_size)?;

    migrations::run_migrations(&pool)?;

    let sessions_state = sessions::SessionsState { pool: pool.clone() };
    let plans_state = plans::PlansState {
        plan_repo: PlanRepository::new(pool.clone()),
    };
    let auth_tokens = AuthTokenRepository::new(pool.clone());

    let app = routes::create_router(sessions_state, plans_state, auth_tokens);

    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
