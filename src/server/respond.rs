//! Writing a resolved [`ServeTarget`] out as a response.

use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use futures::stream::{self, StreamExt};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::ServeError;
use crate::listing::{render, render_archive_root};
use crate::path::PathPartition;
use crate::resolve::{ServeTarget, list_archive_dir, list_fs_dir};
use crate::sniff::{SNIFF_LEN, sniff};

const STREAM_BUFFER: usize = 1 << 16;

pub async fn respond(target: ServeTarget, partition: &PathPartition) -> Result<Response, ServeError> {
    match target {
        ServeTarget::FilesystemDirectory { dir, .. } => {
            let entries = list_fs_dir(dir, &partition.fs_segments).await?;
            Ok(Html(render(entries)).into_response())
        }
        ServeTarget::FilesystemFile { path, file, len } => stream_file(&path, file, len).await,
        ServeTarget::FilesystemSymlink { .. } => Err(ServeError::Forbidden("file is a symlink")),
        ServeTarget::FilesystemOther { .. } => Err(ServeError::Forbidden(
            "file isn't a regular file or directory",
        )),
        ServeTarget::ArchiveRoot { archive, link_base } => {
            let entries = list_archive_dir(&archive, "", &link_base);
            Ok(Html(render_archive_root(entries)).into_response())
        }
        ServeTarget::ArchiveInternalDirectory {
            archive,
            dir,
            link_base,
        } => {
            let entries = list_archive_dir(&archive, &dir, &link_base);
            Ok(Html(render(entries)).into_response())
        }
        ServeTarget::ArchiveInternalFile { archive, entry } => {
            let mut chunks = archive
                .stream_entry(&entry)
                .await
                .map_err(ServeError::ArchiveRead)?;
            let (content_type, head) = match extension_type(Path::new(&entry.file_name)) {
                Some(content_type) => (content_type, None),
                None => {
                    let head = match chunks.next_chunk().await {
                        Some(chunk) => chunk.map_err(|err| ServeError::ArchiveRead(err.into()))?,
                        None => Vec::new(),
                    };
                    (sniff(&head).to_string(), Some(head))
                }
            };
            let body = stream::iter(head.map(Ok)).chain(chunks.into_stream());
            Ok(sized_response(
                content_type,
                Body::from_stream(body),
                entry.uncompressed_size,
            ))
        }
        ServeTarget::ArchiveDownload {
            file,
            len,
            file_name,
        } => {
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                file_name.replace(['"', '\\'], "_")
            ))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

            let mut response = file_response("application/octet-stream".to_string(), file, len);
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, disposition);
            Ok(response)
        }
    }
}

async fn stream_file(path: &Path, mut file: tokio::fs::File, len: u64) -> Result<Response, ServeError> {
    let content_type = match extension_type(path) {
        Some(content_type) => content_type,
        None => {
            let mut head = Vec::with_capacity(SNIFF_LEN);
            (&mut file)
                .take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .await
                .map_err(ServeError::Open)?;
            file.rewind().await.map_err(ServeError::Open)?;
            sniff(&head).to_string()
        }
    };

    Ok(file_response(content_type, file, len))
}

fn file_response(content_type: String, file: tokio::fs::File, len: u64) -> Response {
    let body = Body::from_stream(ReaderStream::with_capacity(file, STREAM_BUFFER));
    sized_response(content_type, body, len)
}

fn sized_response(content_type: String, body: Body, len: u64) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

/// Content type by extension; text types get an explicit UTF-8 charset.
fn extension_type(path: &Path) -> Option<String> {
    let mime = mime_guess::from_path(path).first()?;
    if mime.type_() == mime_guess::mime::TEXT && mime.get_param("charset").is_none() {
        Some(format!("{}; charset=utf-8", mime.essence_str()))
    } else {
        Some(mime.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type_for(path: &Path, data: &[u8]) -> String {
        extension_type(path).unwrap_or_else(|| sniff(data).to_string())
    }

    #[test]
    fn extension_wins_over_sniffing() {
        assert_eq!(
            content_type_for(Path::new("style.css"), b"<html>"),
            "text/css; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("a.png"), b""), "image/png");
    }

    #[test]
    fn unknown_extensions_are_sniffed() {
        assert_eq!(
            content_type_for(Path::new("README"), b"plain words"),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("blob.unknownext"), b"\x00\x01"),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for(Path::new("page"), b"<!DOCTYPE html>"),
            "text/html; charset=utf-8"
        );
    }
}
