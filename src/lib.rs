//! Mercado Libre price watch client
//!
//! Signs a user in through a hosted identity provider (implicit flow), keeps
//! the identity token in local key-value storage, and keeps a list of tracked
//! listings in sync with the remote product API.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use meli_price_watch::prelude::*;
//!
//! # async fn run() -> Result<(), Error> {
//! let options = ClientOptions::from_env()?;
//! let navigator = Arc::new(MemoryNavigator::parse(&options.redirect_uri)?);
//! let store = Arc::new(FileStore::new(".price-watch.json"));
//! let app = PriceWatch::with_http(options, store, navigator)?;
//!
//! match app.start().await {
//!     Some(dashboard) => {
//!         for product in dashboard.products() {
//!             println!("{} {:?}", product.url, product.status());
//!         }
//!     }
//!     None => app.login()?,
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod fetch;
pub mod products;
pub mod session;

pub use crate::app::PriceWatch;

/// A convenience module for common imports
pub mod prelude {
    pub use crate::app::PriceWatch;
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::products::{
        derive_status, CollectionState, HttpProductApi, PriceStatus, ProductApi, ProductSync,
        TrackedProduct,
    };
    pub use crate::session::{
        FileStore, KeyValueStore, MemoryNavigator, MemoryStore, Navigator, Session,
        SessionManager,
    };
}
