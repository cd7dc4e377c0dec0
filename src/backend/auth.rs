use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use super::{BackendClient, BackendError, check};

/// Account as reported by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful password sign-in.
#[derive(Debug, Deserialize)]
pub struct AuthSession {
    #[serde(deserialize_with = "secret")]
    pub access_token: SecretString,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl BackendClient {
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .request(Method::POST, url, None)
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
            }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .request(Method::POST, url, None)
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
            }))
            .send()
            .await?;
        Ok(check(response).await?.json::<AuthSession>().await?)
    }

    /// Resolve the user behind an access token. Fails once the token is revoked or expired.
    pub async fn get_user(&self, access_token: &SecretString) -> Result<User, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;
        Ok(check(response).await?.json::<User>().await?)
    }

    pub async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
