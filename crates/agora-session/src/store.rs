//! The single durable session slot.
//!
//! One `SimulationSession` lives under one key, serialized as JSON in one
//! file. Reads hand out clones of the in-memory value and never block on
//! I/O; writes replace the value wholesale and persist it. There is no
//! partial update and no versioning. A caller that reads, merges, and
//! writes without re-reading can lose another merge's fields; the console
//! assumes a single active operator and keeps that surface as-is.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use agora_types::SimulationSession;

use crate::errors::SessionError;

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

const SESSION_FILE_NAME: &str = "session.json";

/// Handle to the durable session slot. Cloning shares the same slot.
#[derive(Clone, Debug)]
pub struct SessionStore {
    state: Arc<RwLock<SimulationSession>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Opens the store backed by the given file, loading the prior session
    /// if one exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<SessionStore, SessionError> {
        let path = path.into();
        let session = load_session(&path)?;

        return Ok(SessionStore {
            state: Arc::new(RwLock::new(session)),
            path: Some(path),
        });
    }

    /// Opens the store at the platform default location
    /// (`<cache dir>/agora/session.json`).
    pub fn open_default() -> Result<SessionStore, SessionError> {
        let dir = dirs::cache_dir().ok_or(SessionError::NoStoragePath)?;
        return SessionStore::open(dir.join("agora").join(SESSION_FILE_NAME));
    }

    /// A store with no backing file. Used by tests and dry runs.
    pub fn in_memory() -> SessionStore {
        return SessionStore {
            state: Arc::new(RwLock::new(SimulationSession::default())),
            path: None,
        };
    }

    /// Current session value. A clone; mutating it does nothing until it is
    /// written back.
    pub fn read(&self) -> SimulationSession {
        let guard = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        return guard.clone();
    }

    /// Replaces the session wholesale and persists it. The new value is
    /// visible to every reader of this slot as soon as this returns.
    pub fn write(&self, next: SimulationSession) -> Result<(), SessionError> {
        {
            let mut guard = self
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *guard = next.clone();
        }

        return self.persist(&next);
    }

    /// Resets the session to the documented empty object. This is the
    /// landing-page behavior: arriving at the start of the wizard wipes
    /// everything.
    pub fn clear(&self) -> Result<(), SessionError> {
        return self.write(SimulationSession::default());
    }

    fn persist(&self, session: &SimulationSession) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SessionError::Storage {
                path: path.display().to_string(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(session)?;
        fs::write(path, json).map_err(|source| SessionError::Storage {
            path: path.display().to_string(),
            source,
        })?;

        return Ok(());
    }
}

fn load_session(path: &Path) -> Result<SimulationSession, SessionError> {
    if !path.exists() {
        return Ok(SimulationSession::default());
    }

    let raw = fs::read_to_string(path).map_err(|source| SessionError::Storage {
        path: path.display().to_string(),
        source,
    })?;

    return Ok(serde_json::from_str(&raw)?);
}

/// Explicit provider for the session store.
///
/// The store is never a global. Whatever owns the operator's session
/// installs a store here and hands the scope to collaborators; asking for
/// a handle before installation is a programmer error and fails loudly
/// rather than silently producing a default session.
#[derive(Default)]
pub struct SessionScope {
    store: Option<SessionStore>,
}

impl SessionScope {
    pub fn empty() -> SessionScope {
        return SessionScope { store: None };
    }

    /// Installs the store this scope provides. Replaces any prior one.
    pub fn install(&mut self, store: SessionStore) {
        self.store = Some(store);
    }

    /// The installed store, or [`SessionError::OutsideScope`] when
    /// `install` has not run.
    pub fn handle(&self) -> Result<SessionStore, SessionError> {
        return self.store.clone().ok_or(SessionError::OutsideScope);
    }

    /// Tears the scope down. Subsequent `handle` calls fail again.
    pub fn release(&mut self) {
        self.store = None;
    }
}
