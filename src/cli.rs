use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipserve")]
#[command(version)]
#[command(about = "Serve a directory over HTTP, browsing into zip archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipserve                         serve the current directory on 127.0.0.1:8000\n  \
  zipserve -b 0.0.0.0 -p 9000 ~/pub   share ~/pub on all interfaces\n  \
  zipserve -c cert.pem -k key.pem .   serve over HTTPS")]
pub struct Cli {
    /// Path to the directory to serve
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    pub directory: PathBuf,

    /// Quiet; disable all logging
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Port to listen on
    #[arg(short = 'p', value_name = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Listener socket's bind address
    #[arg(short = 'b', value_name = "ADDRESS", default_value = "127.0.0.1")]
    pub bind: String,

    /// PEM-format X.509 certificate (requires -k)
    #[arg(short = 'c', value_name = "CERTFILE", requires = "key_file")]
    pub cert_file: Option<PathBuf>,

    /// PEM-format private key (requires -c)
    #[arg(short = 'k', value_name = "KEYFILE", requires = "cert_file")]
    pub key_file: Option<PathBuf>,
}

/// Certificate and key for the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// Validated settings, fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Canonical path of the served directory.
    pub root: PathBuf,
    pub listen_addr: SocketAddr,
    pub tls: Option<TlsFiles>,
    pub quiet: bool,
}

impl Cli {
    /// Check the arguments against the environment and resolve them.
    pub fn into_config(self) -> Result<ServerConfig> {
        let tls = match (self.cert_file, self.key_file) {
            (Some(cert_file), Some(key_file)) => Some(TlsFiles {
                cert_file,
                key_file,
            }),
            (None, None) => None,
            _ => bail!("You must specify both -c certfile -k keyfile."),
        };

        let listen_addr = (self.bind.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| {
                anyhow!(
                    "Could not resolve the address to listen to: {}:{}",
                    self.bind,
                    self.port
                )
            })?;

        let metadata = std::fs::metadata(&self.directory)
            .with_context(|| format!("{}", self.directory.display()))?;
        if !metadata.is_dir() {
            bail!("{} isn't a directory.", self.directory.display());
        }
        let root = self
            .directory
            .canonicalize()
            .with_context(|| format!("{}", self.directory.display()))?;

        Ok(ServerConfig {
            root,
            listen_addr,
            tls,
            quiet: self.quiet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zipserve").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.directory, PathBuf::from("."));
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.bind, "127.0.0.1");
        assert!(!cli.quiet);

        let config = cli.into_config().unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8000".parse().unwrap());
        assert!(config.root.is_absolute());
        assert!(config.tls.is_none());
    }

    #[test]
    fn tls_needs_both_files() {
        assert!(Cli::try_parse_from(["zipserve", "-c", "cert.pem"]).is_err());
        assert!(Cli::try_parse_from(["zipserve", "-k", "key.pem"]).is_err());

        let cli = Cli {
            cert_file: Some("cert.pem".into()),
            key_file: None,
            ..parse(&[])
        };
        let err = cli.into_config().unwrap_err();
        assert!(err.to_string().contains("both -c certfile -k keyfile"));

        let config = parse(&["-c", "cert.pem", "-k", "key.pem"]).into_config().unwrap();
        assert_eq!(
            config.tls,
            Some(TlsFiles {
                cert_file: "cert.pem".into(),
                key_file: "key.pem".into(),
            })
        );
    }

    #[test]
    fn root_must_be_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let err = parse(&[path]).into_config().unwrap_err();
        assert!(err.to_string().contains("isn't a directory"));

        assert!(parse(&["/definitely/not/here"]).into_config().is_err());
    }

    #[test]
    fn flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let config = parse(&["-q", "-p", "9001", "-b", "::1", path]).into_config().unwrap();
        assert!(config.quiet);
        assert_eq!(config.listen_addr, "[::1]:9001".parse().unwrap());
        assert_eq!(config.root, dir.path().canonicalize().unwrap());

        assert!(Cli::try_parse_from(["zipserve", "-p", "70000"]).is_err());
    }
}
