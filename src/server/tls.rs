use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use axum_server::tls_rustls::RustlsConfig;

/// Build a TLS server configuration from PEM-encoded certificate chain and key files.
pub fn load_rustls_config(cert_file: &Path, key_file: &Path) -> Result<RustlsConfig> {
    // Several providers may be compiled in; pin one. Failing means one is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let mut cert_reader = BufReader::new(
        File::open(cert_file)
            .with_context(|| format!("failed to open certificate {}", cert_file.display()))?,
    );
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse certificate {}", cert_file.display()))?;
    if certs.is_empty() {
        bail!("no certificates found in {}", cert_file.display());
    }

    let mut key_reader = BufReader::new(
        File::open(key_file).with_context(|| format!("failed to open key {}", key_file.display()))?,
    );
    let key = rustls_pemfile::private_key(&mut key_reader)
        .with_context(|| format!("failed to parse key {}", key_file.display()))?
        .ok_or_else(|| anyhow!("no private key found in {}", key_file.display()))?;

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("certificate and key do not form a usable pair")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}
