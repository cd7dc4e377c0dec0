//! Signed-in restaurant views: links, QR code, menu upload.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Serialize;
use tower_sessions::Session;

use crate::AppState;
use crate::error::AppError;
use crate::menu::{self, AccountId, MenuLinks};
use crate::qr;
use crate::session;
use crate::upload::{self, PublishedMenu};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub email: Option<String>,
    pub account_id: Option<String>,
    #[serde(flatten)]
    pub menu: Option<MenuLinks>,
    /// PNG data URL, `None` when the QR code couldn't be generated.
    pub qr_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub published: PublishedMenu,
    pub menu_page_url: String,
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Json<DashboardView>, AppError> {
    let (user, _) = session::require_user(&state, &session).await?;
    let account = AccountId::parse(&user.id);
    let origin = menu::site_origin(state.config.site_origin.as_ref(), &headers);

    let links = account
        .as_ref()
        .map(|account| MenuLinks::resolve(&origin, account, state.store.as_ref()));
    let qr_code = links
        .as_ref()
        .and_then(|links| qr::try_data_url(&links.menu_page_url));

    Ok(Json(DashboardView {
        email: user.email,
        account_id: account.map(|a| a.to_string()),
        menu: links,
        qr_code,
    }))
}

pub async fn upload_menu(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let (user, token) = session::require_user(&state, &session).await?;
    let account = AccountId::parse(&user.id);
    if account.is_none() {
        tracing::warn!(user = %user.id, "backend user id is not usable as an account id");
    }

    let file = upload::read_menu_file(multipart).await?;
    let published = upload::publish_menu(state.store.as_ref(), account.as_ref(), file, &token).await?;

    let origin = menu::site_origin(state.config.site_origin.as_ref(), &headers);
    // publish_menu only succeeds with an account
    let menu_page_url = account
        .as_ref()
        .map(|account| menu::menu_page_url(&origin, account).to_string())
        .unwrap_or_default();

    Ok(Json(UploadResponse {
        published,
        menu_page_url,
    }))
}

pub async fn download_qr(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let unavailable = || AppError::NotFound("QR could not be generated.".to_string());

    let (user, _) = session::require_user(&state, &session).await?;
    let account = AccountId::parse(&user.id).ok_or_else(unavailable)?;
    let origin = menu::site_origin(state.config.site_origin.as_ref(), &headers);
    let payload = menu::menu_page_url(&origin, &account);

    let png = qr::encode_png(payload.as_str()).map_err(|err| {
        tracing::warn!(account = %account, error = %err, "QR generation failed");
        unavailable()
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"menu-qr.png\""),
        ],
        png,
    ))
}
