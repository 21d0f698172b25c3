use anyhow::{Context, Result};
use sports_aggregator::{server, Aggregator, Config, StaticTeamDirectory};
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sports_aggregator=info".parse()?),
        )
        .init();

    info!("Sports Aggregator v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let teams = Arc::new(StaticTeamDirectory::builtin());
    info!("Loaded {} teams into the directory", teams.len());

    let aggregator = Aggregator::from_config(&config, teams).context("failed to build HTTP clients")?;
    let app = server::router(Arc::new(aggregator));

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    // Handle shutdown gracefully
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            if let Err(e) = result {
                error!("Server error: {:?}", e);
                return Err(e.into());
            }
        }
        _ = &mut ctrl_c => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
