//! Ties the session to the product controller

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::ClientOptions;
use crate::error::Result;
use crate::products::{HttpProductApi, ProductApi, ProductSync};
use crate::session::{KeyValueStore, Navigator, Session, SessionManager};

/// The whole client: a session manager plus, while signed in, a product
/// controller bound to that session's token.
pub struct PriceWatch {
    session: SessionManager,
    api: Arc<dyn ProductApi>,
    dashboard: RwLock<Option<Arc<ProductSync>>>,
}

impl PriceWatch {
    /// Assemble the client from its collaborators
    pub fn new(
        options: ClientOptions,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        api: Arc<dyn ProductApi>,
    ) -> Self {
        Self {
            session: SessionManager::new(options, store, navigator),
            api,
            dashboard: RwLock::new(None),
        }
    }

    /// Assemble the client against the HTTP product API in `options`
    pub fn with_http(
        options: ClientOptions,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let api = Arc::new(HttpProductApi::new(&options)?);
        Ok(Self::new(options, store, navigator, api))
    }

    /// Resolve the session and, if there is one, mount the product controller
    /// and load the list. The fetch outcome is recorded on the controller.
    pub async fn start(&self) -> Option<Arc<ProductSync>> {
        let session = self.session.resolve_session()?;
        let dashboard = self.mount(&session);

        if let Err(e) = dashboard.fetch_all().await {
            debug!(error = %e, "initial product fetch failed");
        }

        Some(dashboard)
    }

    /// Bind the controller to `session`, reusing the mounted one if any
    fn mount(&self, session: &Session) -> Arc<ProductSync> {
        let mut slot = self
            .dashboard
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match &*slot {
            Some(dashboard) => {
                dashboard.remount(session.token.clone());
                dashboard.clone()
            }
            None => {
                let dashboard = Arc::new(ProductSync::new(self.api.clone(), session.token.clone()));
                *slot = Some(dashboard.clone());
                dashboard
            }
        }
    }

    /// The mounted product controller, while signed in
    pub fn dashboard(&self) -> Option<Arc<ProductSync>> {
        self.dashboard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The active session
    pub fn session(&self) -> Option<Session> {
        self.session.session()
    }

    /// Go to the identity provider's login page
    pub fn login(&self) -> Result<()> {
        self.session.login()
    }

    /// Tear down the product controller, forget the session and go to the
    /// identity provider's logout page
    pub fn logout(&self) -> Result<()> {
        let dashboard = self
            .dashboard
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(dashboard) = dashboard {
            dashboard.teardown();
        }

        self.session.logout()
    }
}
