use std::sync::Arc;

use clap::Parser;
use numberlike::config::{Cli, Config};
use numberlike::handler::AppState;
use numberlike::likes::Likes;
use numberlike::routes::routes;
use numberlike::store::RedisStore;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // .env is optional; real deployments pass the environment directly
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("numberlike.svc starting");

    let cfg = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?args.config_path, "failed to load config");
        std::process::exit(1);
    });

    let store = RedisStore::new(&cfg.store).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to connect to store");
        std::process::exit(1);
    });
    let likes = Likes::new(Arc::new(store));

    let app = routes()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState { likes });

    let address = cfg.app.address();
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let cancellation_token = CancellationToken::new();
    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
        shutdown_token.cancel();
    });

    tracing::info!("numberlike.svc running on {}", &address);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await;
    if let Err(err) = result {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }

    tracing::info!("numberlike.svc going off, graceful shutdown complete");
}
