// src/serve/handlers.rs

//! HTTP endpoint implementations.
//!
//! Failure policy: 404 only when no file has ever been resolved or the
//! resolved file is gone from disk. Internal faults (conversion failures,
//! panicked blocking tasks) degrade to raw-byte delivery instead of 5xx.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::warn;

use crate::state::LatestImage;

use super::AppState;
use super::convert::{content_type_for, encode_png, is_web_friendly};

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Latest Image</title>
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
    body { font-family: system-ui, sans-serif; margin: 1.2rem; }
    header { margin-bottom: 0.8rem; }
    img { max-width: 100%; height: auto; display: block; }
    .meta { color: #555; font-size: 0.95rem; margin-bottom: 0.8rem; }
    .bar { display:flex; gap:1rem; align-items:center; margin-bottom:0.5rem }
    button { padding: 0.35rem 0.7rem; }
    code { background:#f2f2f2; padding:0.15rem 0.35rem; border-radius: 6px; }
  </style>
</head>
<body>
  <header>
    <h1>Latest Image</h1>
    <div class="meta">
<!--META-->
    </div>
    <div class="bar">
      <button onclick="forceRefresh()">Refresh</button>
      <label>Auto-refresh
        <select id="interval" onchange="setIntervalFromSelect()">
          <option value="0">Off</option>
          <option value="1">1s</option>
          <option value="3" selected>3s</option>
          <option value="5">5s</option>
          <option value="10">10s</option>
        </select>
      </label>
<!--DOWNLOAD-->
    </div>
  </header>
<!--PREVIEW-->
  <script>
    let timer = null;
    function refreshImage() {
      const img = document.getElementById('preview');
      if (!img) return;
      const u = new URL(img.src, window.location);
      u.searchParams.set('v', Date.now().toString());
      img.src = u.toString();
    }
    function forceRefresh() { refreshImage(); }
    function setIntervalFromSelect() {
      const sel = document.getElementById('interval');
      const s = parseInt(sel.value, 10);
      if (timer) { clearInterval(timer); timer = null; }
      if (s > 0) {
        timer = setInterval(refreshImage, s * 1000);
      }
    }
    setIntervalFromSelect();
  </script>
</body>
</html>
"#;

/// `GET /` — HTML status + auto-refreshing preview.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let page = match state.latest.snapshot() {
        Some(latest) => {
            let meta = format!(
                "<div>File: <code>{}</code></div>\n<div>Size: {} bytes</div>\n<div>Modified: {}</div>\n<div>Version: {}</div>",
                escape_html(&latest.name()),
                latest.size,
                format_mtime(&latest),
                latest.version,
            );
            let preview = format!(
                r#"  <img id="preview" src="/image?v={}" alt="Latest image preview">"#,
                latest.version
            );
            INDEX_TEMPLATE
                .replace("<!--META-->", &meta)
                .replace("<!--PREVIEW-->", &preview)
                .replace(
                    "<!--DOWNLOAD-->",
                    r#"      <a href="/download">Download original</a>"#,
                )
        }
        None => INDEX_TEMPLATE
            .replace("<!--META-->", "        <div>No image found yet.</div>")
            .replace("<!--PREVIEW-->", "")
            .replace("<!--DOWNLOAD-->", ""),
    };
    Html(page)
}

#[derive(Debug, Serialize)]
pub struct StatusPayload {
    ok: bool,
    latest: Option<LatestPayload>,
}

#[derive(Debug, Serialize)]
struct LatestPayload {
    path: String,
    name: String,
    size: u64,
    mtime: f64,
}

/// `GET /status` — JSON snapshot of the latest-image record.
pub async fn status(State(state): State<AppState>) -> Json<StatusPayload> {
    let latest = state.latest.snapshot().map(|latest| LatestPayload {
        path: latest.path.display().to_string(),
        name: latest.name(),
        size: latest.size,
        mtime: latest.mtime_secs(),
    });
    Json(StatusPayload { ok: true, latest })
}

/// `GET /image` — raw bytes for browser-native formats, converted PNG
/// otherwise, raw-download fallback when conversion fails.
pub async fn image(State(state): State<AppState>) -> Response {
    let Some(latest) = state.latest.snapshot() else {
        return not_found();
    };

    if is_web_friendly(&latest.path) {
        return match tokio::fs::read(&latest.path).await {
            Ok(bytes) => inline_image(bytes, content_type_for(&latest.path), latest.version),
            Err(_) => not_found(),
        };
    }

    if let Some(png) = state.cache.get(&latest.path, latest.mtime) {
        return inline_image(png.as_ref().clone(), "image/png", latest.version);
    }

    let converted = {
        let path = latest.path.clone();
        tokio::task::spawn_blocking(move || encode_png(&path)).await
    };
    match converted {
        Ok(Ok(png)) => {
            let png = state
                .cache
                .put(latest.path.clone(), latest.mtime, png);
            inline_image(png.as_ref().clone(), "image/png", latest.version)
        }
        Ok(Err(err)) => {
            warn!(path = %latest.path.display(), %err, "conversion failed, serving original");
            raw_fallback(&latest).await
        }
        Err(err) => {
            warn!(%err, "conversion task failed, serving original");
            raw_fallback(&latest).await
        }
    }
}

/// `GET /download` — original bytes as an attachment.
pub async fn download(State(state): State<AppState>) -> Response {
    let Some(latest) = state.latest.snapshot() else {
        return not_found();
    };
    match tokio::fs::read(&latest.path).await {
        Ok(bytes) => attachment(bytes, &latest),
        Err(_) => not_found(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "No image available").into_response()
}

fn inline_image(bytes: Vec<u8>, content_type: &str, version: u64) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, NO_CACHE.to_string()),
            (header::ETAG, format!("W/{version}")),
        ],
        bytes,
    )
        .into_response()
}

/// Undecodable file: hand the raw bytes over as a download instead.
async fn raw_fallback(latest: &LatestImage) -> Response {
    match tokio::fs::read(&latest.path).await {
        Ok(bytes) => attachment(bytes, latest),
        Err(_) => not_found(),
    }
}

fn attachment(bytes: Vec<u8>, latest: &LatestImage) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", latest.name()),
            ),
            (header::CACHE_CONTROL, NO_CACHE.to_string()),
            (header::ETAG, format!("W/{}", latest.version)),
        ],
        bytes,
    )
        .into_response()
}

fn format_mtime(latest: &LatestImage) -> String {
    DateTime::<Local>::from(latest.mtime)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
