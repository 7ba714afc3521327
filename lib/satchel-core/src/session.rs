//! Session token lifecycle.
//!
//! A [`Session`] owns the bearer token of one signed-in user. The token is
//! persisted through a [`TokenStore`] under [`TOKEN_KEY`], so a restarted
//! process picks it up again on first use. A [`Navigator`] is told where to
//! go when the API rejects the token.
//!
//! ```
//! use satchel_core::{MemoryTokenStore, Session, SessionState};
//!
//! let store = MemoryTokenStore::new();
//! let session = Session::new(store.clone());
//! session.set(Some("tok-1")).expect("store");
//!
//! // A fresh session over the same storage sees the token.
//! let reloaded = Session::new(store);
//! assert_eq!(reloaded.token().as_deref(), Some("tok-1"));
//! assert_eq!(reloaded.state(), SessionState::Authenticated);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Error, Result};

/// Storage key holding the raw token.
pub const TOKEN_KEY: &str = "auth_token";

// ============================================================================
// Token Store
// ============================================================================

/// Persistent storage for the session token.
pub trait TokenStore: Send + Sync {
    /// Read the stored token, `None` when unset.
    fn load(&self) -> Result<Option<String>>;

    /// Store `token`, replacing any previous one.
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Removing an absent token succeeds.
    fn clear(&self) -> Result<()>;
}

/// In-memory token store.
///
/// Clones share the same slot, which makes it a stand-in for storage that
/// outlives any one [`Session`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token store backed by a file named [`TOKEN_KEY`] in a directory.
///
/// The file holds the raw token and nothing else. A single trailing newline,
/// as left by editors, is ignored on load.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token in `<dir>/auth_token`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    /// Path of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token
                    .strip_suffix('\n')
                    .map_or(token.as_str(), |t| t.strip_suffix('\r').unwrap_or(t));
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::token_store(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::token_store(format!("creating {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, token)
            .map_err(|e| Error::token_store(format!("writing {}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(Error::token_store(
                format!("removing {}: {e}", self.path.display()),
            )),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// Moves the user to another screen, e.g. the login route after a 401.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn navigate(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, route: &str) {
        self(route);
    }
}

// ============================================================================
// Session
// ============================================================================

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No token: calls go out without an `authorization` header.
    Unauthenticated,
    /// A token is set and attached to every call.
    Authenticated,
}

/// In-memory view of the token.
#[derive(Debug, Clone)]
enum Slot {
    /// The store has not been read yet.
    Unloaded,
    /// Memory is authoritative from now on.
    Loaded(Option<String>),
}

/// The signed-in user's token, kept in memory and written through to a
/// [`TokenStore`].
///
/// The store is read once, on first use. After that, or after any
/// [`set`](Self::set), memory is authoritative: a token cleared here stays
/// cleared even if the store could not remove it.
pub struct Session {
    slot: RwLock<Slot>,
    store: Option<Arc<dyn TokenStore>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::ephemeral()
    }
}

impl Session {
    /// Create a session persisted through `store`. Nothing is read until the
    /// token is first needed.
    #[must_use]
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self::with_store(Arc::new(store))
    }

    /// Create a session over a shared store.
    #[must_use]
    pub fn with_store(store: Arc<dyn TokenStore>) -> Self {
        Self {
            slot: RwLock::new(Slot::Unloaded),
            store: Some(store),
        }
    }

    /// Create a session with no persistent storage.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            slot: RwLock::new(Slot::Loaded(None)),
            store: None,
        }
    }

    /// The current token. An empty token reads as `None`.
    ///
    /// The first call reads the store. A failed read is logged, reads as
    /// "no token", and is retried on the next call.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        if let Slot::Loaded(token) = &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            return token.clone();
        }

        let stored = match self.store.as_ref()?.load() {
            Ok(stored) => stored.filter(|token| !token.is_empty()),
            Err(error) => {
                tracing::warn!(%error, "could not read stored session token");
                return None;
            }
        };

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent `set` wins over what was just read.
        if matches!(*slot, Slot::Unloaded) {
            *slot = Slot::Loaded(stored);
        }
        match &*slot {
            Slot::Loaded(token) => token.clone(),
            Slot::Unloaded => None,
        }
    }

    /// Replace the token, or remove it with `None`. `Some("")` removes it
    /// too.
    ///
    /// The in-memory token changes even when persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenStore`] if the store could not be updated.
    pub fn set(&self, token: Option<&str>) -> Result<()> {
        let token = token.filter(|token| !token.is_empty());
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) =
            Slot::Loaded(token.map(str::to_string));

        let Some(store) = &self.store else {
            return Ok(());
        };
        match token {
            Some(token) => store.save(token),
            None => store.clear(),
        }
    }

    /// Forget the token. Equivalent to `set(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenStore`] if the stored token could not be removed.
    pub fn clear(&self) -> Result<()> {
        self.set(None)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.token().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }
}
