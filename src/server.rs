//! Static file server
//!
//! A small HTTP server that serves the application bundle from a
//! directory, with permissive cross-origin headers on every route and
//! a fixed entry document at the root path.

use std::path::{Component, Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use crate::error::Error;
use crate::Result;

/// Default serving port
pub const DEFAULT_PORT: u16 = 8000;

/// Entry document served at `/`
const INDEX_FILE: &str = "index.html";

/// 404 body
const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Mural | Not Found</title></head>
<body><h1>404</h1><p>No such file.</p></body>
</html>"#;

/// Static file server rooted at a directory.
pub struct StaticServer {
    root: PathBuf,
    port: u16,
}

impl StaticServer {
    pub fn new(root: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root: root.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Bind and serve until the process exits.
    pub async fn run(&self) -> Result<()> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Serving {} at http://{}", self.root.display(), addr);

        loop {
            let (socket, _) = listener
                .accept()
                .await
                .map_err(|e| Error::Server(format!("Failed to accept connection: {}", e)))?;

            let root = self.root.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, &root).await {
                    tracing::debug!("Connection error: {}", e);
                }
            });
        }
    }
}

async fn handle_connection(mut socket: TcpStream, root: &Path) -> Result<()> {
    let mut buffer = vec![0u8; 4096];
    let n = socket
        .read(&mut buffer)
        .await
        .map_err(|e| Error::Server(format!("Failed to read request: {}", e)))?;

    let request = String::from_utf8_lossy(&buffer[..n]);

    let response = match parse_request_path(&request) {
        Ok(request_path) => match resolve_path(root, &request_path) {
            Some(file_path) => serve_file(&file_path).await,
            None => not_found_response(),
        },
        Err(_) => build_response("400 Bad Request", "text/html", NOT_FOUND_HTML.as_bytes()),
    };

    let _ = socket.write_all(&response).await;
    let _ = socket.shutdown().await;
    Ok(())
}

/// Parse the request line and extract the decoded URL path.
///
/// Only GET is accepted; the query string is discarded.
fn parse_request_path(request: &str) -> Result<String> {
    let first_line = request
        .lines()
        .next()
        .ok_or_else(|| Error::Server("Empty request".to_string()))?;

    // Parse: GET /path?query HTTP/1.1
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(Error::Server("Invalid request format".to_string()));
    }
    if parts[0] != "GET" {
        return Err(Error::Server(format!("Unsupported method: {}", parts[0])));
    }

    let full_url = format!("http://localhost{}", parts[1]);
    let url = Url::parse(&full_url)
        .map_err(|e| Error::Server(format!("Failed to parse request URL: {}", e)))?;

    Ok(url.path().to_string())
}

/// Resolve a URL path to a file under the root.
///
/// `/` maps to the entry document; any path that would escape the root
/// is rejected.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let relative = if relative.is_empty() {
        INDEX_FILE
    } else {
        relative
    };

    let candidate = Path::new(relative);
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }

    Some(root.join(candidate))
}

async fn serve_file(path: &Path) -> Vec<u8> {
    match tokio::fs::read(path).await {
        Ok(body) => build_response("200 OK", content_type_for(path), &body),
        Err(_) => not_found_response(),
    }
}

fn not_found_response() -> Vec<u8> {
    build_response("404 Not Found", "text/html", NOT_FOUND_HTML.as_bytes())
}

/// Assemble a full HTTP/1.1 response. Every response carries the
/// permissive CORS header.
fn build_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );

    let mut response = header.into_bytes();
    response.extend_from_slice(body);
    response
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
