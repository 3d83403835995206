use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::{ClientError, Transport};

/// A [`Transport`] sending requests with a [`reqwest::Client`].
///
/// Authentication headers are expected to be configured on the client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a transport using `client`.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await.map_err(ClientError::transport)?;
        let status = response.status();
        debug!(path, %status, "Received response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                path: path.to_string(),
                status,
                body,
            });
        }
        let bytes = response.bytes().await.map_err(ClientError::transport)?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(path, self.client.post(self.url(path)).json(body)).await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        self.send(path, self.client.get(self.url(path)).query(query)).await
    }
}
