//! The signed-in account, kept in the server-side session.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::AppState;
use crate::backend::auth::{AuthSession, User};
use crate::error::AppError;

const ACCOUNT_KEY: &str = "account";

#[derive(Clone, Serialize, Deserialize)]
pub struct SignedIn {
    pub account_id: String,
    pub email: Option<String>,
    access_token: String,
}

impl SignedIn {
    pub fn from_auth(auth: &AuthSession) -> Self {
        use secrecy::ExposeSecret;
        Self {
            account_id: auth.user.id.clone(),
            email: auth.user.email.clone(),
            access_token: auth.access_token.expose_secret().to_string(),
        }
    }

    pub fn access_token(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }
}

impl fmt::Debug for SignedIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedIn")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

pub async fn remember(session: &Session, signed_in: SignedIn) -> Result<(), AppError> {
    // new id on privilege change
    session.cycle_id().await?;
    session.insert(ACCOUNT_KEY, signed_in).await?;
    Ok(())
}

pub async fn current(session: &Session) -> Result<Option<SignedIn>, AppError> {
    Ok(session.get::<SignedIn>(ACCOUNT_KEY).await?)
}

/// Forget the session, returning what it held.
pub async fn forget(session: &Session) -> Result<Option<SignedIn>, AppError> {
    let signed_in = current(session).await?;
    session.flush().await?;
    Ok(signed_in)
}

/// The session's user, re-checked against the identity backend on every call.
///
/// A token the backend no longer accepts ends the session.
pub async fn require_user(
    state: &AppState,
    session: &Session,
) -> Result<(User, SecretString), AppError> {
    let signed_in = current(session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;
    let token = signed_in.access_token();

    match state.backend.get_user(&token).await {
        Ok(user) => Ok((user, token)),
        Err(err) if err.is_client_error() => {
            tracing::debug!(account = %signed_in.account_id, error = %err, "session token rejected");
            session.flush().await?;
            Err(AppError::Unauthorized("Not signed in".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}
