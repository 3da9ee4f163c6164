//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::serve::{RELOAD_JS, ReloadVars, script_tag};
use crate::utils::mime::{self, types};

/// Respond with a file from the served directory.
pub fn respond_file(request: Request, path: &Path, live_reload: bool) -> Result<()> {
    let content_type = mime::from_path(path);
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type, live_reload);
    send_body(request, 200, content_type, body)
}

/// Respond with `404.html` from the served directory when present.
pub fn respond_not_found(request: Request, root: &Path, live_reload: bool) -> Result<()> {
    let custom = root.join("404.html");
    let has_custom = custom.is_file();

    if is_head_request(&request) {
        let content_type = if has_custom { types::HTML } else { types::PLAIN };
        return send_head(request, 404, content_type);
    }

    if has_custom && let Ok(body) = fs::read(&custom) {
        let body = maybe_inject_reload(body, types::HTML, live_reload);
        return send_body(request, 404, types::HTML, body);
    }

    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with the live-reload client from memory.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, types::JAVASCRIPT);
    }
    let body = RELOAD_JS.render(&ReloadVars { ws_port });
    send_body(request, 200, types::JAVASCRIPT, body.into_bytes())
}

/// Respond with 503 (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

fn maybe_inject_reload(body: Vec<u8>, content_type: &str, live_reload: bool) -> Vec<u8> {
    if live_reload && mime::is_html(content_type) {
        inject_before_body_end(&body, script_tag().as_bytes())
    } else {
        body
    }
}

/// Insert `snippet` before the last `</body>`, or append it.
fn inject_before_body_end(content: &[u8], snippet: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let at = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + snippet.len());
    result.extend_from_slice(&content[..at]);
    result.extend_from_slice(snippet);
    result.extend_from_slice(&content[at..]);
    result
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn header(field: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(field, value).map_err(|()| anyhow!("invalid header {field}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_last_body() {
        let html = b"<html><body><p>x</p></BODY></html>";
        let out = inject_before_body_end(html, b"<s/>");
        assert_eq!(out, b"<html><body><p>x</p><s/></BODY></html>");
    }

    #[test]
    fn test_inject_appends_without_body() {
        let out = inject_before_body_end(b"<p>x</p>", b"<s/>");
        assert_eq!(out, b"<p>x</p><s/>");
    }

    #[test]
    fn test_only_html_gets_script() {
        let css = maybe_inject_reload(b"a{}".to_vec(), types::CSS, true);
        assert_eq!(css, b"a{}");

        let html = maybe_inject_reload(b"<body></body>".to_vec(), types::HTML, true);
        assert!(String::from_utf8(html).unwrap().contains("/__gust/reload.js"));

        let plain = maybe_inject_reload(b"<body></body>".to_vec(), types::HTML, false);
        assert_eq!(plain, b"<body></body>");
    }
}
