//! The remote product API

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::types::{NewProduct, TrackedProduct};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Authenticated access to the user's tracked products.
///
/// The server owns the collection and decides who the caller is from `token`.
#[async_trait]
pub trait ProductApi: Send + Sync {
    /// `GET /products`
    async fn list(&self, token: &str) -> Result<Vec<TrackedProduct>>;

    /// `POST /products`
    async fn add(&self, token: &str, product: &NewProduct) -> Result<()>;

    /// `DELETE /products/{id}`
    async fn remove(&self, token: &str, id: &str) -> Result<()>;
}

/// [`ProductApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpProductApi {
    base_url: Url,
    client: Client,
}

impl HttpProductApi {
    /// Build a client for `options.api_url`, honoring the request timeout
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(&options.api_url, builder.build()?)
    }

    /// Use an existing HTTP client
    pub fn with_client(api_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(api_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("{} cannot be an API base URL", api_url)));
        }
        Ok(Self { base_url, client })
    }

    fn endpoint(&self, id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::config("API base URL cannot have a path"))?;
            segments.pop_if_empty().push("products");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn list(&self, token: &str) -> Result<Vec<TrackedProduct>> {
        let url = self.endpoint(None)?;
        Fetch::get(&self.client, url.as_str())
            .authorization(token)?
            .execute::<Vec<TrackedProduct>>()
            .await
    }

    async fn add(&self, token: &str, product: &NewProduct) -> Result<()> {
        let url = self.endpoint(None)?;
        Fetch::post(&self.client, url.as_str())
            .authorization(token)?
            .json(product)?
            .execute_empty()
            .await
    }

    async fn remove(&self, token: &str, id: &str) -> Result<()> {
        let url = self.endpoint(Some(id))?;
        Fetch::delete(&self.client, url.as_str())
            .authorization(token)?
            .execute_empty()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_the_stage_prefix() {
        let api =
            HttpProductApi::with_client("https://api.example/dev", Client::new()).unwrap();

        assert_eq!(
            api.endpoint(None).unwrap().as_str(),
            "https://api.example/dev/products"
        );
        assert_eq!(
            api.endpoint(Some("a b/c")).unwrap().as_str(),
            "https://api.example/dev/products/a%20b%2Fc"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let api = HttpProductApi::with_client("http://127.0.0.1:8080/", Client::new()).unwrap();
        assert_eq!(
            api.endpoint(None).unwrap().as_str(),
            "http://127.0.0.1:8080/products"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(
            HttpProductApi::with_client("mailto:someone@example.com", Client::new()),
            Err(Error::Config(_))
        ));
    }
}
