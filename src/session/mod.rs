//! Identity token lifecycle: extraction from the login redirect, persistence,
//! restoration and logout.

mod claims;
mod navigator;
mod store;

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientOptions;
use crate::error::Result;

pub use navigator::*;
pub use store::*;

/// Fragment parameter carrying the identity token
const ID_TOKEN_PARAM: &str = "id_token";

/// An active login.
///
/// `email` is decoded from the token without verification and is only for
/// display. Only `token` is ever sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential issued by the identity provider
    pub token: String,

    /// Email claim of the token, if it could be read
    pub email: Option<String>,
}

/// What the redirect fragment told us
enum Callback {
    Token(String),
    Rejected { error: String, description: Option<String> },
    Absent,
}

/// Resolves, persists and invalidates the identity token
pub struct SessionManager {
    options: ClientOptions,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create a new manager. No session is active until
    /// [`resolve_session`](Self::resolve_session) runs.
    pub fn new(
        options: ClientOptions,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            options,
            store,
            navigator,
            current: RwLock::new(None),
        }
    }

    /// Work out the active session at startup.
    ///
    /// A token in the location fragment wins and replaces whatever was
    /// persisted; otherwise the persisted pair is restored as-is.
    pub fn resolve_session(&self) -> Option<Session> {
        let location = self.navigator.location();

        let session = match read_callback(&location) {
            Callback::Token(token) => {
                self.strip_fragment(location);
                Some(self.accept_token(token))
            }
            Callback::Rejected { error, description } => {
                warn!(
                    %error,
                    description = description.as_deref().unwrap_or(""),
                    "identity provider rejected the login"
                );
                self.strip_fragment(location);
                self.restore()
            }
            Callback::Absent => self.restore(),
        };

        self.set_current(session.clone());
        session
    }

    /// The active session, if any
    pub fn session(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current identity token, if a session is active
    pub fn token(&self) -> Option<String> {
        self.session().map(|session| session.token)
    }

    /// Authorization request asking the provider for an implicit-flow token
    pub fn login_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/login", self.options.identity_url))?;
        url.query_pairs_mut()
            .append_pair("response_type", "token")
            .append_pair("client_id", &self.options.client_id)
            .append_pair("redirect_uri", &self.options.redirect_uri);
        Ok(url)
    }

    /// The provider's end-session endpoint
    pub fn logout_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/logout", self.options.identity_url))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.options.client_id)
            .append_pair("logout_uri", &self.options.redirect_uri);
        Ok(url)
    }

    /// Send the user to the hosted login page
    pub fn login(&self) -> Result<()> {
        let url = self.login_url()?;
        info!("redirecting to identity provider login");
        self.navigator.assign(url)
    }

    /// Forget the session and send the user to the provider's logout page.
    ///
    /// Safe to call with no active session. Storage failures are logged and
    /// do not stop the redirect.
    pub fn logout(&self) -> Result<()> {
        self.set_current(None);

        for key in [&self.options.token_key, &self.options.email_key] {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key.as_str(), error = %e, "failed to clear persisted session entry");
            }
        }

        let url = self.logout_url()?;
        info!("redirecting to identity provider logout");
        self.navigator.assign(url)
    }

    fn accept_token(&self, token: String) -> Session {
        let email = match claims::decode_email(&token) {
            Ok(email) => Some(email),
            Err(e) => {
                warn!(error = %e, "could not read email from identity token");
                None
            }
        };

        self.persist(&token, email.as_deref());
        debug!("session established from login redirect");

        Session { token, email }
    }

    fn persist(&self, token: &str, email: Option<&str>) {
        if let Err(e) = self.store.set(&self.options.token_key, token) {
            warn!(error = %e, "failed to persist identity token");
        }

        // Keep the pair consistent: a previous login's email must not
        // outlive its token.
        let written = match email {
            Some(email) => self.store.set(&self.options.email_key, email),
            None => self.store.remove(&self.options.email_key),
        };
        if let Err(e) = written {
            warn!(error = %e, "failed to persist session email");
        }
    }

    fn restore(&self) -> Option<Session> {
        let token = match self.store.get(&self.options.token_key) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read persisted identity token");
                return None;
            }
        };

        let email = self
            .store
            .get(&self.options.email_key)
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to read persisted session email");
                None
            })
            .filter(|email| !email.is_empty());

        debug!("session restored from storage");
        Some(Session { token, email })
    }

    fn strip_fragment(&self, mut location: Url) {
        location.set_fragment(None);
        self.navigator.replace(location);
    }

    fn set_current(&self, session: Option<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

fn read_callback(location: &Url) -> Callback {
    let fragment = match location.fragment() {
        Some(fragment) if !fragment.is_empty() => fragment,
        _ => return Callback::Absent,
    };

    let mut error = None;
    let mut description = None;

    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match &*key {
            ID_TOKEN_PARAM if !value.is_empty() => return Callback::Token(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    match error {
        Some(error) => Callback::Rejected { error, description },
        None => Callback::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(location: &str, store: Arc<MemoryStore>) -> (SessionManager, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::parse(location).unwrap());
        let manager = SessionManager::new(ClientOptions::default(), store, navigator.clone());
        (manager, navigator)
    }

    #[test]
    fn restores_persisted_session() {
        let store = Arc::new(MemoryStore::with_entries([
            ("userIdToken", "abc"),
            ("userEmail", "u@x.com"),
        ]));
        let (manager, _) = manager("https://app.example/", store);

        let session = manager.resolve_session().unwrap();
        assert_eq!(
            session,
            Session {
                token: "abc".to_string(),
                email: Some("u@x.com".to_string()),
            }
        );
        assert_eq!(manager.session(), Some(session));
    }

    #[test]
    fn no_fragment_and_empty_store_means_no_session() {
        let (manager, _) = manager("https://app.example/", Arc::new(MemoryStore::new()));
        assert_eq!(manager.resolve_session(), None);
        assert_eq!(manager.token(), None);
    }

    #[test]
    fn opaque_token_in_fragment_is_still_accepted() {
        let store = Arc::new(MemoryStore::with_entries([("userEmail", "old@x.com")]));
        let (manager, navigator) = manager(
            "https://app.example/#id_token=opaque&token_type=Bearer",
            store.clone(),
        );

        let session = manager.resolve_session().unwrap();
        assert_eq!(session.token, "opaque");
        assert_eq!(session.email, None);

        assert_eq!(store.get("userIdToken").unwrap(), Some("opaque".to_string()));
        assert_eq!(store.get("userEmail").unwrap(), None);
        assert_eq!(navigator.location().fragment(), None);
    }

    #[test]
    fn provider_error_falls_back_to_storage() {
        let store = Arc::new(MemoryStore::with_entries([("userIdToken", "kept")]));
        let (manager, navigator) = manager(
            "https://app.example/#error=access_denied&error_description=User+cancelled",
            store,
        );

        let session = manager.resolve_session().unwrap();
        assert_eq!(session.token, "kept");
        assert_eq!(session.email, None);
        assert_eq!(navigator.location().as_str(), "https://app.example/");
    }

    #[test]
    fn login_url_carries_client_parameters() {
        let (manager, navigator) = manager("https://app.example/", Arc::new(MemoryStore::new()));
        manager.login().unwrap();

        let url = navigator.last_assigned().unwrap();
        assert_eq!(url.path(), "/login");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("response_type".to_string(), "token".to_string()),
                ("client_id".to_string(), "5f5au2pifdhpl45ujoeac09nd9".to_string()),
                (
                    "redirect_uri".to_string(),
                    "https://main.d2ax6decp23hvd.amplifyapp.com/".to_string()
                ),
            ]
        );
    }
}
