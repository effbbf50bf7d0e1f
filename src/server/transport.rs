use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;

use crate::cli::ServerConfig;

use super::{AppState, QuietRequestLog, RequestLog, TracingRequestLog, load_rustls_config, router};

/// Grace period for in-flight requests after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Bind the configured address and serve until interrupted.
pub async fn run(config: ServerConfig) -> Result<()> {
    let tls = match &config.tls {
        Some(tls) => Some(load_rustls_config(&tls.cert_file, &tls.key_file)?),
        None => None,
    };

    let listener = TcpListener::bind(config.listen_addr)
        .with_context(|| format!("failed to listen on {}", config.listen_addr))?;

    let log: Arc<dyn RequestLog> = if config.quiet {
        Arc::new(QuietRequestLog)
    } else {
        Arc::new(TracingRequestLog)
    };
    let state = AppState::new(config.root.clone(), log);

    tracing::info!(
        "Serving {} over {} on {}",
        config.root.display(),
        if tls.is_some() { "HTTPS" } else { "HTTP" },
        config.listen_addr
    );

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    serve(listener, state, tls, handle).await
}

/// Serve on an already bound listener, plain or TLS, until `handle` shuts it down.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    tls: Option<RustlsConfig>,
    handle: Handle,
) -> Result<()> {
    listener.set_nonblocking(true)?;
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    match tls {
        Some(tls) => {
            axum_server::from_tcp_rustls(listener, tls)
                .handle(handle)
                .serve(app)
                .await
        }
        None => axum_server::from_tcp(listener).handle(handle).serve(app).await,
    }
    .context("server stopped")
}

async fn shutdown_on_ctrl_c(handle: Handle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
        handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    }
}
