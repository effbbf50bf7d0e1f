//! The request dispatcher and its transport.
//!
//! Every request goes through [`dispatch`]: log it, refuse anything but
//! `GET`, partition the path, resolve it against the filesystem or an
//! archive, and write the result. Errors become responses here and never
//! travel further.

mod log;
mod respond;
mod tls;
mod transport;

pub use log::{QuietRequestLog, RequestLog, RequestRecord, TracingRequestLog, init_tracing};
pub use tls::load_rustls_config;
pub use transport::{run, serve};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};

use crate::error::ServeError;
use crate::path::segment;
use crate::resolve::{resolve_archive, resolve_fs};

/// Read-only state shared by all requests.
#[derive(Clone)]
pub struct AppState {
    root: Arc<PathBuf>,
    log: Arc<dyn RequestLog>,
}

impl AppState {
    /// `root` must be a canonical path to an existing directory.
    pub fn new(root: PathBuf, log: Arc<dyn RequestLog>) -> Self {
        Self {
            root: Arc::new(root),
            log,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// Every path, every method, one handler.
pub fn router(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();

    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    state.log.record(&RequestRecord {
        client: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
        user_agent,
        method: &parts.method,
        version: parts.version,
        host,
        target,
    });

    let mut response = match serve_get(&state, &parts.method, &parts.uri).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    // Listings and archive contents change underneath us; never cache.
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn serve_get(
    state: &AppState,
    method: &Method,
    uri: &axum::http::Uri,
) -> Result<Response, ServeError> {
    if method != Method::GET {
        return Err(ServeError::MethodNotAllowed);
    }

    let partition = segment(uri.path())?;
    let target = match &partition.archive_segment {
        Some(archive) => {
            resolve_archive(
                state.root(),
                &partition.fs_segments,
                archive,
                &partition.inner_segments,
                wants_download(uri.query()),
            )
            .await?
        }
        None => resolve_fs(state.root(), &partition.fs_segments).await?,
    };
    tracing::debug!(?target, "resolved");

    respond::respond(target, &partition).await
}

/// Whether the query string carries a `download` key, with or without a value.
fn wants_download(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&')
            .any(|pair| pair.split('=').next() == Some("download"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_flag() {
        assert!(wants_download(Some("download")));
        assert!(wants_download(Some("download=1")));
        assert!(wants_download(Some("x=2&download")));
        assert!(!wants_download(Some("downloads")));
        assert!(!wants_download(Some("x=download")));
        assert!(!wants_download(None));
    }
}
