//! HTTP remote store client.
//!
//! Maps the repository contract onto a REST resource. The actual HTTP
//! client is abstracted via a trait to allow different implementations
//! (reqwest, hyper, a browser fetch bridge, etc.).

use crate::entity::Entity;
use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::Repository;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// A request handed to an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

/// A response returned by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. A returned
/// `Err` means the request never produced a response (connection refused,
/// timeout, DNS failure) and is treated as retryable.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// REST client for one entity resource.
///
/// | Operation | Request |
/// |-----------|---------|
/// | `get_all` | `GET {base}/{resource}` |
/// | `get_by_id` | `GET {base}/{resource}/{id}` |
/// | `insert` | `POST {base}/{resource}` |
/// | `update` | `PUT {base}/{resource}/{id}` |
/// | `delete_by_id`, `delete_by_entity` | `DELETE {base}/{resource}/{id}` |
/// | `delete_all` | `DELETE {base}/{resource}` |
///
/// `404` maps to `None`/`false`; `5xx` and transport failures to retryable
/// remote errors; any other non-success status to a fatal remote error.
pub struct HttpRemote<T, C> {
    base_url: String,
    resource: String,
    client: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity, C: HttpClient> HttpRemote<T, C> {
    /// Creates a client for the resource named after `T`.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            resource: T::NAME.to_string(),
            client,
            _marker: PhantomData,
        }
    }

    /// Overrides the resource path segment.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, self.resource)
    }

    fn item_url(&self, key: i64) -> String {
        format!("{}/{}/{}", self.base_url, self.resource, key)
    }

    /// Sends a request. `Ok(None)` for 404.
    async fn call(
        &self,
        method: Method,
        url: String,
        body: Option<Vec<u8>>,
    ) -> RepositoryResult<Option<HttpResponse>> {
        tracing::debug!(%method, %url, "remote request");

        let response = self
            .client
            .send(HttpRequest {
                method,
                url: url.clone(),
                body,
            })
            .await
            .map_err(|e| RepositoryError::remote_retryable(format!("{} {}: {}", method, url, e)))?;

        match response.status {
            200..=299 => Ok(Some(response)),
            404 => Ok(None),
            status @ 500..=599 => Err(RepositoryError::remote_retryable(format!(
                "{} {} returned {}",
                method, url, status
            ))),
            status => Err(RepositoryError::remote_fatal(format!(
                "{} {} returned {}",
                method, url, status
            ))),
        }
    }
}

fn decode<V: DeserializeOwned>(body: &[u8]) -> RepositoryResult<V> {
    Ok(serde_json::from_slice(body)?)
}

#[async_trait]
impl<T: Entity, C: HttpClient> Repository<T> for HttpRemote<T, C> {
    async fn get_all(&self) -> RepositoryResult<Vec<T>> {
        match self.call(Method::Get, self.collection_url(), None).await? {
            Some(response) => decode(&response.body),
            None => Ok(Vec::new()),
        }
    }

    async fn get_by_id(&self, key: i64) -> RepositoryResult<Option<T>> {
        match self.call(Method::Get, self.item_url(key), None).await? {
            Some(response) => decode(&response.body).map(Some),
            None => Ok(None),
        }
    }

    async fn insert(&self, entity: T) -> RepositoryResult<Option<T>> {
        let body = serde_json::to_vec(&entity)?;
        match self.call(Method::Post, self.collection_url(), Some(body)).await? {
            Some(response) => decode(&response.body).map(Some),
            None => Ok(None),
        }
    }

    async fn update(&self, entity: T) -> RepositoryResult<Option<T>> {
        let body = serde_json::to_vec(&entity)?;
        match self
            .call(Method::Put, self.item_url(entity.key()), Some(body))
            .await?
        {
            // 204 No Content: the server applied the entity as sent
            Some(response) if response.body.is_empty() => Ok(Some(entity)),
            Some(response) => decode(&response.body).map(Some),
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, key: i64) -> RepositoryResult<bool> {
        Ok(self
            .call(Method::Delete, self.item_url(key), None)
            .await?
            .is_some())
    }

    async fn delete_by_entity(&self, entity: &T) -> RepositoryResult<bool> {
        self.delete_by_id(entity.key()).await
    }

    async fn delete_all(&self) -> RepositoryResult<bool> {
        Ok(self
            .call(Method::Delete, self.collection_url(), None)
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_entity::Account;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replies with scripted responses and records requests.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedClient {
        fn reply(self, status: u16, body: &str) -> Self {
            self.replies
                .lock()
                .push_back(Ok(HttpResponse::new(status, body.as_bytes().to_vec())));
            self
        }

        fn fail(self, message: &str) -> Self {
            self.replies.lock().push_back(Err(message.to_string()));
            self
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            self.requests.lock().push(request);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted reply".into()))
        }
    }

    fn remote(client: ScriptedClient) -> HttpRemote<Account, ScriptedClient> {
        HttpRemote::new("https://api.example.com/", client)
    }

    #[tokio::test]
    async fn routes_follow_rest_conventions() {
        let client = ScriptedClient::default()
            .reply(200, "[]")
            .reply(200, r#"{"id":3,"name":"a","balance":0}"#)
            .reply(201, r#"{"id":57,"name":"a","balance":0}"#)
            .reply(204, "")
            .reply(200, "")
            .reply(200, "");
        let remote = remote(client);

        remote.get_all().await.unwrap();
        remote.get_by_id(3).await.unwrap();
        remote.insert(Account::new(1, "a", 0)).await.unwrap();
        remote.update(Account::new(57, "b", 0)).await.unwrap();
        remote.delete_by_id(57).await.unwrap();
        remote.delete_all().await.unwrap();

        let seen: Vec<_> = remote
            .client()
            .requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.url))
            .collect();
        assert_eq!(
            seen,
            [
                "GET https://api.example.com/Account",
                "GET https://api.example.com/Account/3",
                "POST https://api.example.com/Account",
                "PUT https://api.example.com/Account/57",
                "DELETE https://api.example.com/Account/57",
                "DELETE https://api.example.com/Account",
            ]
        );
    }

    #[tokio::test]
    async fn insert_returns_server_record() {
        let remote = remote(ScriptedClient::default().reply(201, r#"{"id":57,"name":"Acme","balance":0}"#));

        let inserted = remote.insert(Account::new(1, "Acme", 0)).await.unwrap();
        assert_eq!(inserted, Some(Account::new(57, "Acme", 0)));

        let body = remote.client().requests()[0].body.clone().unwrap();
        let sent: Account = serde_json::from_slice(&body).unwrap();
        assert_eq!(sent, Account::new(1, "Acme", 0));
    }

    #[tokio::test]
    async fn update_without_body_echoes_entity() {
        let remote = remote(ScriptedClient::default().reply(204, ""));
        let updated = remote.update(Account::new(5, "x", 1)).await.unwrap();
        assert_eq!(updated, Some(Account::new(5, "x", 1)));
    }

    #[tokio::test]
    async fn not_found_is_none_or_false() {
        let remote = remote(
            ScriptedClient::default()
                .reply(404, "")
                .reply(404, "")
                .reply(404, "")
                .reply(404, ""),
        );

        assert_eq!(remote.get_by_id(1).await.unwrap(), None);
        assert_eq!(remote.update(Account::new(1, "a", 0)).await.unwrap(), None);
        assert!(!remote.delete_by_entity(&Account::new(1, "a", 0)).await.unwrap());
        assert!(remote.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_classification() {
        let remote = remote(
            ScriptedClient::default()
                .reply(503, "")
                .reply(400, "")
                .fail("connection refused"),
        );

        let err = remote.get_all().await.unwrap_err();
        assert!(err.is_retryable());

        let err = remote.get_all().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Remote { retryable: false, .. }));

        let err = remote.get_all().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn malformed_body_is_codec_error() {
        let remote = remote(ScriptedClient::default().reply(200, "not json"));
        assert!(matches!(
            remote.get_all().await,
            Err(RepositoryError::Codec(_))
        ));
    }

    #[tokio::test]
    async fn resource_override() {
        let remote = remote(ScriptedClient::default().reply(200, "[]")).with_resource("api/accounts");
        remote.get_all().await.unwrap();
        assert_eq!(
            remote.client().requests()[0].url,
            "https://api.example.com/api/accounts"
        );
    }
}
