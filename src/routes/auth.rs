use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tower_sessions::Session;

use crate::AppState;
use crate::backend::auth::Credentials;
use crate::error::AppError;
use crate::session::{self, SignedIn};

#[derive(Debug, Serialize)]
pub struct SignedInResponse {
    pub account_id: String,
    pub email: Option<String>,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, &'static str), AppError> {
    state.backend.sign_up(&credentials).await?;
    tracing::info!(email = %credentials.email, "account created");
    Ok((StatusCode::CREATED, "Account created! You can now log in."))
}

pub async fn log_in(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SignedInResponse>, AppError> {
    let auth = state
        .backend
        .sign_in_with_password(&credentials)
        .await
        .map_err(|err| {
            if err.is_client_error() {
                AppError::Unauthorized(err.message())
            } else {
                err.into()
            }
        })?;

    let signed_in = SignedIn::from_auth(&auth);
    let response = SignedInResponse {
        account_id: signed_in.account_id.clone(),
        email: signed_in.email.clone(),
    };
    session::remember(&session, signed_in).await?;

    tracing::info!(account = %response.account_id, "signed in");
    Ok(Json(response))
}

pub async fn log_out(State(state): State<AppState>, session: Session) -> Result<StatusCode, AppError> {
    if let Some(signed_in) = session::forget(&session).await? {
        if let Err(err) = state.backend.sign_out(&signed_in.access_token()).await {
            tracing::warn!(account = %signed_in.account_id, error = %err, "backend sign-out failed");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
