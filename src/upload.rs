//! Menu upload: validate the submitted file and overwrite the account's menu.

use axum::extract::Multipart;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use crate::backend::storage::ObjectStore;
use crate::menu::{AccountId, ObjectKey};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file selected.")]
    NoFile,

    #[error("Please upload a PDF file.")]
    NotPdf,

    #[error("User not ready yet. Please refresh and try again.")]
    NotReady,

    #[error("Invalid upload: {0}")]
    Malformed(String),

    /// Backend refused the write; carries its message verbatim.
    #[error("Upload error: {0}")]
    Backend(String),
}

/// A file taken from the upload form.
#[derive(Debug, Clone)]
pub struct MenuFile {
    pub file_name: Option<String>,
    /// Media type the client declared for the part.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl MenuFile {
    fn is_empty_selection(&self) -> bool {
        self.file_name.as_deref().is_none_or(str::is_empty) && self.bytes.is_empty()
    }

    fn declares_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedMenu {
    pub status: &'static str,
    pub object_key: String,
    pub public_url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Pull the `file` part (or the first part carrying a filename) out of a form.
pub async fn read_menu_file(mut multipart: Multipart) -> Result<Option<MenuFile>, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::Malformed(e.body_text()))?;
        return Ok(Some(MenuFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

/// Overwrite the account's menu with `file`.
///
/// Checks run in order and stop at the first failure: a file must be
/// selected, it must be declared as PDF, and the account must be known. Only
/// then is the store touched. A rejected write leaves whatever was published
/// before in place.
pub async fn publish_menu(
    store: &dyn ObjectStore,
    account: Option<&AccountId>,
    file: Option<MenuFile>,
    bearer: &SecretString,
) -> Result<PublishedMenu, UploadError> {
    let file = file
        .filter(|f| !f.is_empty_selection())
        .ok_or(UploadError::NoFile)?;

    if !file.declares_pdf() {
        tracing::debug!(
            content_type = file.content_type.as_deref().unwrap_or("<none>"),
            "rejected non-PDF upload"
        );
        return Err(UploadError::NotPdf);
    }

    let account = account.ok_or(UploadError::NotReady)?;
    let key = ObjectKey::for_account(account);
    let size = file.bytes.len();

    store
        .upsert(&key, PDF_CONTENT_TYPE, file.bytes, bearer)
        .await
        .map_err(|e| {
            tracing::warn!(account = %account, error = %e, "menu upload rejected by backend");
            UploadError::Backend(e.message())
        })?;

    tracing::info!(account = %account, key = %key, bytes = size, "menu published");

    Ok(PublishedMenu {
        status: "Menu updated",
        public_url: store.public_url(&key).to_string(),
        object_key: key.to_string(),
        uploaded_at: Utc::now(),
    })
}
