//! Configuration options for the price watch client

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_IDENTITY_URL: &str = "https://us-east-1ehrdobgi5.auth.us-east-1.amazoncognito.com";
const DEFAULT_CLIENT_ID: &str = "5f5au2pifdhpl45ujoeac09nd9";
const DEFAULT_REDIRECT_URI: &str = "https://main.d2ax6decp23hvd.amplifyapp.com/";
const DEFAULT_API_URL: &str = "https://io1hs36q95.execute-api.us-east-1.amazonaws.com/dev";

/// Configuration options for the price watch client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base URL of the hosted identity provider (scheme and domain)
    pub identity_url: String,

    /// OAuth client id registered with the identity provider
    pub client_id: String,

    /// Where the identity provider sends the browser after login and logout
    pub redirect_uri: String,

    /// Base URL of the product API, without the `/products` suffix
    pub api_url: String,

    /// Storage key holding the identity token
    pub token_key: String,

    /// Storage key holding the email decoded from the token
    pub email_key: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            token_key: "userIdToken".to_string(),
            email_key: "userEmail".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Build options from `PRICE_WATCH_*` environment variables.
    ///
    /// Unset variables keep their default value.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Ok(value) = env::var("PRICE_WATCH_IDENTITY_URL") {
            options.identity_url = value;
        }
        if let Ok(value) = env::var("PRICE_WATCH_CLIENT_ID") {
            options.client_id = value;
        }
        if let Ok(value) = env::var("PRICE_WATCH_REDIRECT_URI") {
            options.redirect_uri = value;
        }
        if let Ok(value) = env::var("PRICE_WATCH_API_URL") {
            options.api_url = value;
        }
        if let Ok(value) = env::var("PRICE_WATCH_REQUEST_TIMEOUT_SECS") {
            let secs = value.parse::<u64>().map_err(|_| {
                Error::config(format!(
                    "PRICE_WATCH_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    value
                ))
            })?;
            options.request_timeout = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }

        Ok(options)
    }

    /// Set the identity provider base URL
    pub fn with_identity_url(mut self, value: &str) -> Self {
        self.identity_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the OAuth client id
    pub fn with_client_id(mut self, value: &str) -> Self {
        self.client_id = value.to_string();
        self
    }

    /// Set the redirect URI used for login and logout
    pub fn with_redirect_uri(mut self, value: &str) -> Self {
        self.redirect_uri = value.to_string();
        self
    }

    /// Set the product API base URL
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the storage keys for the token and the email
    pub fn with_storage_keys(mut self, token_key: &str, email_key: &str) -> Self {
        self.token_key = token_key.to_string();
        self.email_key = email_key.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
