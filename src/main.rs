use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use machining_ledger as ledger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ledger::config::load_config().context("failed to load configuration")?;
    ledger::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init record store (runs migrations for the SQL backend when enabled)
    let store = ledger::store::from_config(&cfg).await.map_err(|e| {
        error!("Failed to initialize record store: {}", e);
        e
    })?;
    let service = ledger::services::LedgerService::new(store, cfg.report_locale);

    if ledger::cors_layer(&cfg).is_none() {
        error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        anyhow::bail!(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
        );
    }

    // Compose shared app state
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    let backend = service.backend();
    let app = ledger::app(ledger::AppState::new(service, cfg));

    // Bind and serve
    info!(%backend, "machining-ledger listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
