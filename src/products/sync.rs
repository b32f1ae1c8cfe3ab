//! Keeps the locally held product list in step with the server

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use super::api::ProductApi;
use super::types::{NewProduct, ProductDraft, TrackedProduct};
use crate::error::{Error, Result};

const LOAD_ACTION: &str = "load your tracked products";
const ADD_ACTION: &str = "add the product";
const REMOVE_ACTION: &str = "remove the product";

/// Where the collection stands after the last fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionState {
    /// Nothing fetched yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// The last fetch succeeded
    Ready,
    /// The last fetch failed with this message
    Failed(String),
}

#[derive(Debug)]
struct SyncState {
    generation: u64,
    active: bool,
    token: String,
    state: CollectionState,
    products: Vec<TrackedProduct>,
    error: Option<String>,
    draft: ProductDraft,
}

/// The generation and token an operation started with
struct Ticket {
    generation: u64,
    token: String,
}

/// Owner of the tracked-product collection for one session.
///
/// Every operation takes `&self`, so several can be in flight at once.
/// State changes happen in short critical sections that never span an
/// `.await`; whichever response lands last decides what is shown.
///
/// Each [`remount`](Self::remount) or [`teardown`](Self::teardown) starts a
/// new generation. Results of operations started in an earlier one are
/// dropped.
pub struct ProductSync {
    api: Arc<dyn ProductApi>,
    inner: Mutex<SyncState>,
}

impl ProductSync {
    /// Create a controller that acts with `token`
    pub fn new(api: Arc<dyn ProductApi>, token: impl Into<String>) -> Self {
        Self {
            api,
            inner: Mutex::new(SyncState {
                generation: 0,
                active: true,
                token: token.into(),
                state: CollectionState::Idle,
                products: Vec::new(),
                error: None,
                draft: ProductDraft::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` and hand back the ticket the operation belongs to
    fn begin<F>(&self, f: F) -> Result<Ticket>
    where
        F: FnOnce(&mut SyncState),
    {
        let mut inner = self.lock();
        if !inner.active {
            return Err(Error::Detached);
        }
        f(&mut inner);
        Ok(Ticket {
            generation: inner.generation,
            token: inner.token.clone(),
        })
    }

    /// Apply a result, unless the controller moved on since `generation`
    fn apply<F, T>(&self, generation: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut SyncState) -> T,
    {
        let mut inner = self.lock();
        if !inner.active || inner.generation != generation {
            debug!(
                generation,
                current = inner.generation,
                "discarding result from an earlier generation"
            );
            return Err(Error::Detached);
        }
        Ok(f(&mut inner))
    }

    /// Replace the collection with the server's.
    ///
    /// On failure the previous collection stays in place and the state becomes
    /// [`CollectionState::Failed`].
    pub async fn fetch_all(&self) -> Result<()> {
        let ticket = self.begin(|inner| {
            inner.state = CollectionState::Loading;
            inner.error = None;
        })?;

        let result = self.api.list(&ticket.token).await;

        self.apply(ticket.generation, move |inner| match result {
            Ok(products) => {
                info!(count = products.len(), "loaded tracked products");
                inner.products = products;
                inner.state = CollectionState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to load tracked products");
                let message = e.user_message(LOAD_ACTION, false);
                inner.state = CollectionState::Failed(message.clone());
                inner.error = Some(message);
                Err(e)
            }
        })?
    }

    /// Ask the server to track `url` at `threshold`.
    ///
    /// Invalid input fails without a request. Nothing is inserted locally:
    /// after the server accepts, the form is cleared and the whole list is
    /// fetched again so ids and enriched fields come from the server.
    pub async fn create(&self, url: &str, threshold: &str) -> Result<()> {
        let product = match NewProduct::parse(url, threshold) {
            Ok(product) => product,
            Err(e) => {
                // A detached controller has nowhere to show the message.
                let _ = self.begin(|inner| inner.error = Some(e.user_message(ADD_ACTION, true)));
                return Err(e);
            }
        };

        let ticket = self.begin(|inner| inner.error = None)?;

        let result = self.api.add(&ticket.token, &product).await;

        self.apply(ticket.generation, |inner| match &result {
            Ok(()) => inner.draft = ProductDraft::default(),
            Err(e) => inner.error = Some(e.user_message(ADD_ACTION, true)),
        })?;

        if let Err(e) = result {
            error!(error = %e, url = %product.url, "failed to add product");
            return Err(e);
        }

        info!(url = %product.url, threshold = %product.threshold, "product added");

        if let Err(e) = self.fetch_all().await {
            debug!(error = %e, "refresh after adding a product failed");
        }

        Ok(())
    }

    /// [`create`](Self::create) with the current form contents
    pub async fn submit_draft(&self) -> Result<()> {
        let draft = self.draft();
        self.create(&draft.url, &draft.threshold).await
    }

    /// Stop tracking a product.
    ///
    /// The item disappears locally before the server answers. If the server
    /// refuses or cannot be reached, the collection is put back exactly as it
    /// was when the removal started.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut snapshot = Vec::new();
        let ticket = self.begin(|inner| {
            snapshot = inner.products.clone();
            inner.products.retain(|product| product.id != id);
        })?;

        match self.api.remove(&ticket.token, id).await {
            Ok(()) => {
                info!(id, "product removed");
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "failed to remove product, rolling back");
                self.apply(ticket.generation, |inner| {
                    inner.products = snapshot;
                    inner.error = Some(e.user_message(REMOVE_ACTION, false));
                })?;
                Err(e)
            }
        }
    }

    /// Bind the controller to a new session.
    ///
    /// Starts a fresh generation with an empty collection. Results of calls
    /// made with the previous token are dropped when they arrive.
    pub fn remount(&self, token: impl Into<String>) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.active = true;
        inner.token = token.into();
        inner.state = CollectionState::Idle;
        inner.products.clear();
        inner.error = None;
        inner.draft = ProductDraft::default();
        debug!(generation = inner.generation, "product controller remounted");
    }

    /// Detach from the session. Results still in flight are dropped and new
    /// operations fail with [`Error::Detached`].
    pub fn teardown(&self) {
        let mut inner = self.lock();
        inner.active = false;
        inner.generation += 1;
        debug!(generation = inner.generation, "product controller torn down");
    }

    /// False once [`teardown`](Self::teardown) ran
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// The collection as currently shown, in server order
    pub fn products(&self) -> Vec<TrackedProduct> {
        self.lock().products.clone()
    }

    /// Fetch state
    pub fn state(&self) -> CollectionState {
        self.lock().state.clone()
    }

    /// True while a fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.lock().state == CollectionState::Loading
    }

    /// The message to show the user, if the last operation failed
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Dismiss the current error message
    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    /// Current form contents
    pub fn draft(&self) -> ProductDraft {
        self.lock().draft.clone()
    }

    /// Update the URL input
    pub fn set_draft_url(&self, url: impl Into<String>) {
        self.lock().draft.url = url.into();
    }

    /// Update the desired price input
    pub fn set_draft_threshold(&self, threshold: impl Into<String>) {
        self.lock().draft.threshold = threshold.into();
    }
}
