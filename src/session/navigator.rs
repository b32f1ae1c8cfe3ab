//! Navigation surface: the current location and outbound redirects

use std::sync::RwLock;

use url::Url;

use crate::error::{Error, Result};

/// Where the client is running and how it leaves.
pub trait Navigator: Send + Sync {
    /// The location the client was opened at
    fn location(&self) -> Url;

    /// Rewrite the visible location without navigating, like
    /// `history.replaceState`
    fn replace(&self, url: Url);

    /// Navigate away to `url`. Terminal for the current page lifecycle.
    fn assign(&self, url: Url) -> Result<()>;
}

#[derive(Debug)]
struct NavigatorState {
    location: Url,
    assigned: Vec<Url>,
}

/// Navigator that only records what happens to it.
///
/// Used in tests and by hosts that hand the callback URL to the client
/// themselves and perform the redirects out of band.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: RwLock<NavigatorState>,
}

impl MemoryNavigator {
    /// Start at `location`
    pub fn new(location: Url) -> Self {
        Self {
            state: RwLock::new(NavigatorState {
                location,
                assigned: Vec::new(),
            }),
        }
    }

    /// Start at a location given as a string
    pub fn parse(location: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(location)?))
    }

    /// Every URL passed to [`Navigator::assign`], oldest first
    pub fn assigned(&self) -> Vec<Url> {
        match self.state.read() {
            Ok(state) => state.assigned.clone(),
            Err(poisoned) => poisoned.into_inner().assigned.clone(),
        }
    }

    /// The most recent navigation target
    pub fn last_assigned(&self) -> Option<Url> {
        self.assigned().pop()
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> Url {
        match self.state.read() {
            Ok(state) => state.location.clone(),
            Err(poisoned) => poisoned.into_inner().location.clone(),
        }
    }

    fn replace(&self, url: Url) {
        match self.state.write() {
            Ok(mut state) => state.location = url,
            Err(poisoned) => poisoned.into_inner().location = url,
        }
    }

    fn assign(&self, url: Url) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| Error::navigation("navigator lock poisoned"))?;
        state.location = url.clone();
        state.assigned.push(url);
        Ok(())
    }
}
