//! Tracked products: wire types, the remote API and the sync controller

mod api;
mod sync;
mod types;

pub use api::*;
pub use sync::*;
pub use types::*;
