//! Thin JSON-over-HTTP client shared by the explorer adapters.

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use cryptovault_core::error::NetworkError;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// `reqwest` client with the configured timeout and error mapping.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

fn map_err(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout
    } else {
        NetworkError::Request(e.to_string())
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((i, _)) => format!("{}...", &body[..i]),
        None => body.to_string(),
    }
}

/// Build a URL with query parameters, percent-encoding the values.
pub fn url_with_query(base: &str, query: &[(&str, &str)]) -> Result<Url, NetworkError> {
    Url::parse_with_params(base, query).map_err(|e| NetworkError::Request(format!("{base}: {e}")))
}

/// Decode a JSON body, mapping failures to [`NetworkError::Malformed`].
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, NetworkError> {
    serde_json::from_str(body).map_err(|e| NetworkError::Malformed(e.to_string()))
}

impl HttpClient {
    pub fn new(timeout: std::time::Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cryptovault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_err)?;
        Ok(Self { client })
    }

    /// Send a request and return the body of a 2xx response.
    async fn body(&self, request: reqwest::RequestBuilder) -> Result<String, NetworkError> {
        let resp = request.send().await.map_err(map_err)?;
        let status = resp.status();
        let body = resp.text().await.map_err(map_err)?;
        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body: truncate(body.trim()),
            });
        }
        Ok(body)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, NetworkError> {
        debug!(host = url.host_str().unwrap_or(""), path = url.path(), "GET");
        let body = self.body(self.client.get(url)).await?;
        decode_json(&body)
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        payload: &Value,
    ) -> Result<T, NetworkError> {
        debug!(host = url.host_str().unwrap_or(""), path = url.path(), "POST");
        let body = self.body(self.client.post(url).json(payload)).await?;
        decode_json(&body)
    }

    /// POST an `application/x-www-form-urlencoded` body and return the raw text.
    pub async fn post_form_text(&self, url: Url, form: String) -> Result<String, NetworkError> {
        debug!(host = url.host_str().unwrap_or(""), path = url.path(), "POST form");
        self.body(
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form),
        )
        .await
    }
}
