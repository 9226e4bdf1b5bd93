use account_ledger::{api, Ledger, ServerConfig};

use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    set_up_logging()?;
    let config = ServerConfig::parse();
    tracing::debug!(?config, "starting");

    let ledger = Arc::new(Ledger::with_capacity(config.capacity, config.validator()));
    let app = api::router(ledger);

    let address = config.address();
    let server = axum::Server::try_bind(&address)?.serve(app.into_make_service());
    tracing::info!(%address, policy = ?config.policy, "listening");

    server.with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("unable to listen for shutdown signal, err: {}", e);
        std::future::pending::<()>().await;
    }
}

fn set_up_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
