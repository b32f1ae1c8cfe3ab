//! HTTP request helpers for the product API

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Error body shape returned by the product API
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        Self {
            client,
            url: url.to_string(),
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach the identity token.
    ///
    /// The API's authorizer expects the bare token, without a `Bearer` scheme.
    pub fn authorization(mut self, token: &str) -> Result<Self> {
        let value = HeaderValue::from_str(token)
            .map_err(|_| Error::session("identity token is not a valid header value"))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    fn build(self) -> Result<RequestBuilder> {
        let url = Url::parse(&self.url)?;

        let mut req = self.client.request(self.method, url).headers(self.headers);
        if let Some(body) = self.body {
            req = req.body(body);
        }

        Ok(req)
    }

    async fn send(self) -> Result<Response> {
        let method = self.method.clone();
        let url = self.url.clone();
        let response = self.build()?.send().await?;

        debug!(%method, %url, status = response.status().as_u16(), "product api responded");

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .unwrap_or_default()
            .message;

        Err(Error::Api { status, message })
    }

    /// Execute the request and deserialize the response body
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.send().await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute the request, ignoring any success body
    pub async fn execute_empty(self) -> Result<()> {
        self.send().await?;
        Ok(())
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_token_is_a_session_error() {
        let client = Client::new();
        let result = Fetch::get(&client, "https://api.example/products").authorization("abc\ndef");
        assert!(matches!(result, Err(Error::Session(_))));

        let result = Fetch::get(&client, "https://api.example/products").authorization("abc.def.ghi");
        assert!(result.is_ok());
    }
}
