//! Public menu routes. No sign-in required.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{Html, Response},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::AppState;
use crate::error::AppError;
use crate::menu::{AccountId, ObjectKey};
use crate::viewer::{embed, pages};

fn account_or_not_found(raw: &str) -> Result<AccountId, AppError> {
    AccountId::parse(raw).ok_or_else(|| AppError::NotFound("Menu not found".to_string()))
}

/// `GET /m/{account_id}`: the menu in the browser's PDF viewer.
pub async fn menu_page(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let account = account_or_not_found(&account_id)?;
    let pdf_url = state.store.public_url(&ObjectKey::for_account(&account));
    let pages_url = format!("/m/{account}/pages");
    Ok(Html(embed::menu_page(pdf_url.as_str(), &pages_url)))
}

/// `GET /m/{account_id}/pages`: the menu as text, streamed one page at a time.
///
/// The response body owns the render's cancellation guard, so a client that
/// disconnects stops the render.
pub async fn menu_pages(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Response, AppError> {
    let account = account_or_not_found(&account_id)?;
    let pdf_url = state
        .store
        .public_url(&ObjectKey::for_account(&account))
        .to_string();

    let (tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    tokio::spawn(pages::stream_menu(
        state.http.clone(),
        pdf_url,
        state.config.upstream_timeout,
        state.config.max_upload_bytes,
        tx,
        cancel.clone(),
    ));

    let guard = cancel.drop_guard();
    let body = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(event.to_text()), (rx, guard)))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}
