use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, sync::Notify};
use tracing::{debug, error, info, trace, warn};

use crate::config::{initialize_app_state, AppConfig};
use crate::router::create_router;

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

pub async fn serve(config: AppConfig) -> Result<()> {
    trace!("Entering serve function");
    info!("Evermos application starting up");
    let bind_address = config.bind_address();
    let grace_period = config.grace_period();
    debug!("Bind address: {}", bind_address);

    let state = match initialize_app_state(config).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };
    let db = state.db.clone();

    let app = create_router(state);
    debug!("Router created successfully");

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("Evermos API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    let stopping = Arc::new(Notify::new());
    let notify = stopping.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = stopping.notified() => {
            info!("Shutdown signal received, draining for up to {:?}", grace_period);
            match tokio::time::timeout(grace_period, &mut server).await {
                Ok(Ok(())) => debug!("All in-flight requests finished"),
                Ok(Err(e)) => error!("Server error while draining: {}", e),
                Err(_) => warn!("Grace period elapsed with requests still in flight"),
            }
        }
    }

    if let Err(e) = db.close().await {
        error!("Failed to close database connection: {}", e);
    }

    info!("Server shutdown gracefully");
    Ok(())
}
