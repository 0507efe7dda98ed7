//! Durable key-value storage with typed access and a transparent
//! in-memory fallback.
//!
//! The [`Store`] is the single persistence surface for the rest of the
//! crate: `get` never fails (default on miss or error), `set` returns
//! false only on total failure, and every primary-medium failure is
//! classified and delivered to error subscribers so the UI layer can
//! show an advisory banner. Engine code never branches on whether the
//! durable medium is actually available.

mod backend;

pub use backend::{MemoryBackend, SqliteBackend, StorageBackend};

use std::cell::RefCell;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::callbacks::{CallbackList, SubscriptionId};
use crate::error::{StorageError, StorageErrorKind};

/// Fixed kv key the serialized timer engine lives under.
pub const ENGINE_KEY: &str = "timer_engine";

/// Returns `~/.config/focusloop[-dev]/` based on FOCUSLOOP_ENV.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    backend::resolve_data_dir()
}

/// A classified storage failure, as delivered to error subscribers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageErrorEvent {
    pub kind: StorageErrorKind,
    pub key: String,
    pub message: String,
}

/// Typed key-value store over a primary backend with an always-present
/// in-memory fallback.
///
/// Reads consult the fallback first so values written during a primary
/// outage stay visible; a successful primary write clears the stale
/// fallback copy again.
pub struct Store {
    primary: RefCell<Option<Box<dyn StorageBackend>>>,
    fallback: RefCell<MemoryBackend>,
    error_subscribers: RefCell<CallbackList<StorageErrorEvent>>,
}

impl Store {
    /// Open the default SQLite-backed store. If the primary medium
    /// cannot be opened the store still works, ephemeral-only.
    pub fn open() -> Self {
        match SqliteBackend::open() {
            Ok(backend) => Self::with_backend(Box::new(backend)),
            Err(e) => {
                tracing::warn!("primary storage unavailable ({e}); using temporary in-memory storage");
                Self::memory_only()
            }
        }
    }

    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            primary: RefCell::new(Some(backend)),
            fallback: RefCell::new(MemoryBackend::new()),
            error_subscribers: RefCell::new(CallbackList::default()),
        }
    }

    /// A store with no durable medium at all.
    pub fn memory_only() -> Self {
        Self {
            primary: RefCell::new(None),
            fallback: RefCell::new(MemoryBackend::new()),
            error_subscribers: RefCell::new(CallbackList::default()),
        }
    }

    /// True when nothing durable backs this store -- the caller may want
    /// to surface a "using temporary storage" advisory.
    pub fn is_ephemeral(&self) -> bool {
        self.primary.borrow().is_none()
    }

    /// Read `key`, returning `default` on miss or failure. Parse
    /// failures and medium failures are reported, never returned.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        // Fallback first: it only holds a value if a primary write failed.
        let fallback_hit = self.fallback.borrow().get_raw(key).unwrap_or(None);
        let (raw, primary_err) = match fallback_hit {
            Some(value) => (Some(value), None),
            None => {
                let result = match self.primary.borrow().as_ref() {
                    Some(primary) => primary.get_raw(key),
                    None => Ok(None),
                };
                match result {
                    Ok(value) => (value, None),
                    Err(e) => (None, Some(e)),
                }
            }
        };
        // All cell borrows are released before subscribers run.
        if let Some(e) = primary_err {
            self.report(key, &e);
        }

        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    self.report(key, &StorageError::from(e));
                    default
                }
            },
            None => default,
        }
    }

    /// Write `key`. Returns false only on total failure; since the
    /// in-memory fallback cannot fail, false in practice means the value
    /// could not be serialized.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match self.set_checked(key, value) {
            Ok(()) => true,
            // Primary failed but the fallback holds the value.
            Err(StorageError::Parse(_)) => false,
            Err(_) => true,
        }
    }

    /// Like [`Store::set`], but surfaces the primary medium's classified
    /// failure so callers can implement the retry-after-prune contract
    /// for `QuotaExceeded`. The fallback is engaged on failure either
    /// way; the error return is advisory.
    ///
    /// # Errors
    /// Returns the serialization or primary-medium error. When this
    /// returns `Err` for a non-parse failure the value is still readable
    /// through the fallback.
    pub fn set_checked<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                let err = StorageError::from(e);
                self.report(key, &err);
                return Err(err);
            }
        };

        let primary_result = match self.primary.borrow_mut().as_mut() {
            Some(primary) => Some(primary.set_raw(key, &raw)),
            None => None,
        };

        match primary_result {
            // No durable medium at all: the fallback is the medium.
            None => {
                let _ = self.fallback.borrow_mut().set_raw(key, &raw);
                Ok(())
            }
            Some(Ok(())) => {
                // Primary is authoritative again; drop any stale shadow.
                let _ = self.fallback.borrow_mut().remove_raw(key);
                Ok(())
            }
            Some(Err(e)) => {
                // Engage the fallback before subscribers hear about the
                // failure; MemoryBackend writes cannot fail.
                let _ = self.fallback.borrow_mut().set_raw(key, &raw);
                self.report(key, &e);
                Err(e)
            }
        }
    }

    /// Remove `key` from both media. Returns false if the primary
    /// removal failed (the fallback copy is gone regardless).
    pub fn remove(&self, key: &str) -> bool {
        let _ = self.fallback.borrow_mut().remove_raw(key);
        let result = match self.primary.borrow_mut().as_mut() {
            Some(primary) => primary.remove_raw(key),
            None => Ok(()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.report(key, &e);
                false
            }
        }
    }

    /// Subscribe to classified storage failures.
    pub fn on_error(&self, callback: impl FnMut(&StorageErrorEvent) + 'static) -> SubscriptionId {
        self.error_subscribers.borrow_mut().subscribe(callback)
    }

    pub fn unsubscribe_error(&self, id: SubscriptionId) -> bool {
        self.error_subscribers.borrow_mut().unsubscribe(id)
    }

    fn report(&self, key: &str, error: &StorageError) {
        tracing::warn!(key, kind = ?error.kind(), "storage operation failed: {error}");
        let event = StorageErrorEvent {
            kind: error.kind(),
            key: key.to_string(),
            message: error.to_string(),
        };
        // Detach so a subscriber reading the store back does not hit a
        // RefCell double borrow.
        let mut subscribers = self.error_subscribers.borrow_mut().detach();
        subscribers.notify(&event);
        self.error_subscribers.borrow_mut().reattach(subscribers);
    }
}
