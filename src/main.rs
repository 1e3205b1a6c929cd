use std::net::SocketAddr;

use roster::config::Configuration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Read configuration file.
    let config = Configuration::default().read();

    let guard = telemetry(&config)?;

    let state = match roster::initialize_state(config.clone()).await {
        Ok(state) => state,
        Err(err) => {
            // The service is unusable without its database.
            tracing::error!(error = %err, "cannot initialize application state");
            guard.shutdown();
            return Err(err);
        },
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, version = %config.version, "server started");

    axum::serve(listener, roster::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    guard.shutdown();

    Ok(())
}

fn telemetry(
    config: &Configuration,
) -> Result<roster::telemetry::Guard, Box<dyn std::error::Error>> {
    roster::telemetry::init(&config.telemetry).map_err(|err| err as Box<dyn std::error::Error>)
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
