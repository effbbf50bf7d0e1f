//! Request logging, injected into the dispatcher as a capability.

use std::net::SocketAddr;

use axum::http::{Method, Version};
use tracing_subscriber::EnvFilter;

/// One line of access log.
#[derive(Debug)]
pub struct RequestRecord<'a> {
    pub client: Option<SocketAddr>,
    pub user_agent: &'a str,
    pub method: &'a Method,
    pub version: Version,
    pub host: &'a str,
    pub target: &'a str,
}

/// Sink for per-request records. Implementations must not fail loudly:
/// a record that cannot be written is dropped.
pub trait RequestLog: Send + Sync {
    fn record(&self, record: &RequestRecord<'_>);
}

/// Writes each record as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRequestLog;

impl RequestLog for TracingRequestLog {
    fn record(&self, r: &RequestRecord<'_>) {
        let client = r
            .client
            .map_or_else(|| "-".to_string(), |addr| addr.to_string());
        tracing::info!(
            "{} [{}]: {} {:?} {}{}",
            client,
            r.user_agent,
            r.method,
            r.version,
            r.host,
            r.target
        );
    }
}

/// Discards everything; quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietRequestLog;

impl RequestLog for QuietRequestLog {
    fn record(&self, _record: &RequestRecord<'_>) {}
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
