//! Object storage for menu PDFs.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, Url, header};
use secrecy::SecretString;

use super::{BackendClient, BackendError, check};
use crate::menu::ObjectKey;

/// Storage operations the upload flow and link resolution rely on.
///
/// `public_url` is a pure string transform: it never checks that the object exists.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite the object at `key`. `bearer` is the uploading user's token.
    async fn upsert(
        &self,
        key: &ObjectKey,
        content_type: &str,
        body: Bytes,
        bearer: &SecretString,
    ) -> Result<(), BackendError>;

    fn public_url(&self, key: &ObjectKey) -> Url;
}

/// A single public bucket on the backend.
#[derive(Clone)]
pub struct BucketStore {
    client: BackendClient,
    bucket: String,
}

impl BucketStore {
    pub fn new(client: BackendClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for BucketStore {
    async fn upsert(
        &self,
        key: &ObjectKey,
        content_type: &str,
        body: Bytes,
        bearer: &SecretString,
    ) -> Result<(), BackendError> {
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/{}/{}", self.bucket, key))?;
        let response = self
            .client
            .request(Method::POST, url, Some(bearer))
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "true")
            .body(body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, key: &ObjectKey) -> Url {
        public_object_url(self.client.base_url(), &self.bucket, key)
    }
}

fn public_object_url(base: &Url, bucket: &str, key: &ObjectKey) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("/storage/v1/object/public/{bucket}/{key}"));
    url.set_query(None);
    url.set_fragment(None);
    url
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::AccountId;
    use mockito::Matcher;

    fn key() -> ObjectKey {
        ObjectKey::for_account(&AccountId::parse("user-1").unwrap())
    }

    fn store(server: &mockito::ServerGuard) -> BucketStore {
        let client = BackendClient::new(
            reqwest::Client::new(),
            Url::parse(&server.url()).unwrap(),
            SecretString::from("anon-key".to_string()),
        );
        BucketStore::new(client, "menus")
    }

    #[test]
    fn public_url_ignores_base_path_and_query() {
        let base = Url::parse("https://abc.supabase.co/rest?x=1").unwrap();
        assert_eq!(
            public_object_url(&base, "menus", &key()).as_str(),
            "https://abc.supabase.co/storage/v1/object/public/menus/user-1/menu.pdf"
        );
    }

    #[tokio::test]
    async fn upsert_overwrites_fixed_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/menus/user-1/menu.pdf")
            .match_header("x-upsert", "true")
            .match_header("content-type", "application/pdf")
            .match_header("authorization", "Bearer user-token")
            .match_body(Matcher::Exact("%PDF-1.7".to_string()))
            .with_status(200)
            .with_body(r#"{"Key":"menus/user-1/menu.pdf"}"#)
            .create_async()
            .await;

        store(&server)
            .upsert(
                &key(),
                "application/pdf",
                Bytes::from_static(b"%PDF-1.7"),
                &SecretString::from("user-token".to_string()),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upsert_failure_surfaces_backend_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/menus/user-1/menu.pdf")
            .with_status(400)
            .with_body(r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#)
            .create_async()
            .await;

        let err = store(&server)
            .upsert(
                &key(),
                "application/pdf",
                Bytes::from_static(b"%PDF-1.7"),
                &SecretString::from("user-token".to_string()),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "new row violates row-level security policy");
    }
}
