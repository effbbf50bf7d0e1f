#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use tower::ServiceExt;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;
use zipserve::server::{AppState, QuietRequestLog, router};

/// A served directory that lives as long as the fixture.
pub struct Fixture {
    _dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { _dir: dir, root }
    }

    pub fn file(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
        self
    }

    pub fn dir(&self, rel: &str) -> &Self {
        std::fs::create_dir_all(self.root.join(rel)).unwrap();
        self
    }

    /// Write a deflated archive; names ending in `/` become directory records.
    pub fn zip(&self, rel: &str, entries: &[(&str, &[u8])]) -> Vec<u8> {
        let bytes = zip_bytes(entries);
        self.file(rel, &bytes);
        bytes
    }

    pub fn app(&self) -> Router {
        router(AppState::new(self.root.clone(), Arc::new(QuietRequestLog)))
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Method::GET, uri).await
    }

    pub async fn request(&self, method: Method, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.app().oneshot(request).await.unwrap()
    }
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// A stored entry `a` holding "hi" whose central record claims, through a
/// ZIP64 extra field, a compressed size of `u64::MAX`.
pub fn oversized_zip64_zip() -> Vec<u8> {
    let mut crc = flate2::Crc::new();
    crc.update(b"hi");
    let crc = crc.sum().to_le_bytes();
    let mut out = Vec::new();

    out.extend_from_slice(b"PK\x03\x04\x2d\x00");
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&crc);
    out.extend_from_slice(&[2, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0]);
    out.extend_from_slice(b"ahi");

    let cd_offset = out.len() as u32;
    out.extend_from_slice(b"PK\x01\x02\x2d\x00\x2d\x00");
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&crc);
    out.extend_from_slice(&u32::MAX.to_le_bytes());
    out.extend_from_slice(&[2, 0, 0, 0, 1, 0, 12, 0]);
    out.extend_from_slice(&[0; 14]);
    out.push(b'a');
    out.extend_from_slice(&[1, 0, 8, 0]);
    out.extend_from_slice(&u64::MAX.to_le_bytes());
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
