//! `GET /api/pdf?url=` — relay one PDF from the storage host to the caller.
//!
//! Only the storage backend's own host may be fetched, so the endpoint cannot
//! be used as an open proxy. `Range` is forwarded so PDF viewers can fetch
//! partial content.

use std::collections::HashSet;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::Response,
};
use futures::TryStreamExt;
use reqwest::Url;
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;

const CACHE_CONTROL: &str = "public, max-age=3600";
const FORWARDED_HEADERS: [header::HeaderName; 3] = [
    header::ACCEPT_RANGES,
    header::CONTENT_RANGE,
    header::CONTENT_LENGTH,
];

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// Hosts the proxy may fetch from, compared as `host[:port]`.
#[derive(Debug, Clone)]
pub struct AllowList {
    hosts: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_backend(backend_url: &Url) -> Self {
        Self::new(authority(backend_url))
    }

    pub fn permits(&self, url: &Url) -> bool {
        authority(url).is_some_and(|a| self.hosts.contains(&a))
    }
}

/// `host` or `host:port`, the port only when it isn't the scheme default.
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Check the `url` parameter before anything goes on the wire.
pub fn validate_target(raw: Option<&str>, allow: &AllowList) -> Result<Url, AppError> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing url".to_string()))?;
    let url = Url::parse(raw).map_err(|_| AppError::BadRequest("Invalid url".to_string()))?;
    if !allow.permits(&url) {
        tracing::warn!(host = url.host_str().unwrap_or(""), "proxy target host not allowed");
        return Err(AppError::Forbidden("Host not allowed".to_string()));
    }
    Ok(url)
}

pub async fn pdf_proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let target = validate_target(params.url.as_deref(), &state.allow_list)?;

    let mut request = state.http.get(target.clone());
    if let Some(range) = headers.get(header::RANGE) {
        request = request.header(header::RANGE, range.clone());
    }

    let upstream = match tokio::time::timeout(state.config.upstream_timeout, request.send()).await
    {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::warn!(url = %target, error = %err, "upstream fetch failed");
            return Err(upstream_failed());
        }
        Err(_) => {
            tracing::warn!(url = %target, "upstream fetch timed out");
            return Err(upstream_failed());
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        tracing::warn!(url = %target, status = status.as_u16(), "upstream returned error status");
        return Err(upstream_failed());
    }

    let mut builder = Response::builder().status(status).header(
        header::CONTENT_TYPE,
        upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(crate::upload::PDF_CONTENT_TYPE)),
    );
    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }
    builder = builder.header(header::CACHE_CONTROL, CACHE_CONTROL);

    let body = upstream.bytes_stream().map_err(std::io::Error::other);
    builder
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn upstream_failed() -> AppError {
    AppError::BadGateway("Upstream fetch failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow() -> AllowList {
        AllowList::from_backend(&Url::parse("https://abc.supabase.co").unwrap())
    }

    #[test]
    fn missing_or_empty_url_is_bad_request() {
        for raw in [None, Some("")] {
            let err = validate_target(raw, &allow()).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing url"));
        }
    }

    #[test]
    fn unparseable_url_is_bad_request() {
        let err = validate_target(Some("not a url"), &allow()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Invalid url"));
    }

    #[test]
    fn foreign_host_is_forbidden() {
        let err = validate_target(Some("https://evil.example/file.pdf"), &allow()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn lookalike_hosts_and_ports_are_forbidden() {
        for raw in [
            "https://abc.supabase.co.evil.example/x.pdf",
            "https://abc.supabase.co:8443/x.pdf",
            "https://user@evil.example/abc.supabase.co/x.pdf",
        ] {
            assert!(validate_target(Some(raw), &allow()).is_err(), "{raw}");
        }
    }

    #[test]
    fn backend_host_is_allowed_regardless_of_case_and_default_port() {
        for raw in [
            "https://abc.supabase.co/storage/v1/object/public/menus/u/menu.pdf",
            "https://ABC.supabase.co:443/storage/v1/object/public/menus/u/menu.pdf",
        ] {
            assert!(validate_target(Some(raw), &allow()).is_ok(), "{raw}");
        }
    }

    #[test]
    fn explicit_port_must_match() {
        let allow = AllowList::from_backend(&Url::parse("http://127.0.0.1:54321").unwrap());
        assert!(allow.permits(&Url::parse("http://127.0.0.1:54321/a.pdf").unwrap()));
        assert!(!allow.permits(&Url::parse("http://127.0.0.1:54322/a.pdf").unwrap()));
    }
}
