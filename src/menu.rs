//! Public menu resolution.
//!
//! Every link to a restaurant's menu is derived from the account identifier
//! alone: the storage key is `{account_id}/menu.pdf`, the guest-facing page is
//! `{origin}/m/{account_id}`. Nothing here checks that a menu was ever
//! uploaded, so resolution is deterministic and never fails for a valid id.

use std::fmt;
use std::sync::LazyLock;

use axum::http::{HeaderMap, header};
use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::backend::storage::ObjectStore;

const MENU_FILE_NAME: &str = "menu.pdf";

static ACCOUNT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("account id pattern is valid")
});

/// Identifier of a restaurant account, safe to embed in paths and keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn parse(raw: &str) -> Option<Self> {
        ACCOUNT_ID_RE
            .is_match(raw)
            .then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage key of an account's menu. One live object per account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn for_account(account: &AccountId) -> Self {
        Self(format!("{}/{MENU_FILE_NAME}", account.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All derived URLs for one account's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuLinks {
    /// Guest-facing page, also the QR payload.
    pub menu_page_url: String,
    /// Direct public object URL on the storage backend.
    pub menu_pdf_url: String,
    /// Same object through this service's `/api/pdf` proxy.
    pub proxied_pdf_url: String,
}

impl MenuLinks {
    pub fn resolve(origin: &Url, account: &AccountId, store: &dyn ObjectStore) -> Self {
        let key = ObjectKey::for_account(account);
        let menu_pdf_url = store.public_url(&key).to_string();
        Self {
            menu_page_url: menu_page_url(origin, account).to_string(),
            proxied_pdf_url: proxied_url(origin, &menu_pdf_url).to_string(),
            menu_pdf_url,
        }
    }
}

pub fn menu_page_url(origin: &Url, account: &AccountId) -> Url {
    let mut url = origin.clone();
    url.set_path(&format!("/m/{}", account.as_str()));
    url.set_query(None);
    url.set_fragment(None);
    url
}

pub fn proxied_url(origin: &Url, target: &str) -> Url {
    let mut url = origin.clone();
    url.set_path("/api/pdf");
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair("url", target);
    url
}

/// Origin used to build absolute links: the configured one when present,
/// otherwise whatever host the request arrived on.
pub fn site_origin(configured: Option<&Url>, headers: &HeaderMap) -> Url {
    if let Some(origin) = configured {
        return origin.clone();
    }

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let scheme = match header_str("x-forwarded-proto") {
        Some("https") => "https",
        _ => "http",
    };
    let host = header_str("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .unwrap_or("localhost");

    Url::parse(&format!("{scheme}://{host}"))
        .unwrap_or_else(|_| Url::parse("http://localhost").expect("static origin parses"))
}
