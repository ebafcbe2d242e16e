//! Local object addresses for in-memory byte buffers
//!
//! Every address handed out by [`ObjectUrlRegistry::create`] is owned by a
//! single [`ObjectUrl`] handle. The entry stays resolvable until the handle
//! is revoked or dropped, whichever comes first.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};
use uuid::Uuid;

const URL_PREFIX: &str = "blob:reeltrim/";

struct ObjectEntry {
    bytes: Arc<[u8]>,
    mime: String,
}

/// Registry of live object addresses
#[derive(Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, ObjectEntry>>,
}

impl ObjectUrlRegistry {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, ObjectEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a buffer and return the owning handle for its address
    pub fn create(self: &Arc<Self>, bytes: Arc<[u8]>, mime: &str) -> ObjectUrl {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        let size = bytes.len();
        self.entries().insert(
            url.clone(),
            ObjectEntry {
                bytes,
                mime: mime.to_string(),
            },
        );
        debug!(%url, size, mime, "Created object address");

        ObjectUrl {
            url,
            registry: Arc::clone(self),
            revoked: false,
        }
    }

    /// Look up the bytes behind a live address
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.entries().get(url).map(|entry| Arc::clone(&entry.bytes))
    }

    /// MIME type recorded for a live address
    pub fn mime_of(&self, url: &str) -> Option<String> {
        self.entries().get(url).map(|entry| entry.mime.clone())
    }

    /// Number of addresses not yet released
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn revoke(&self, url: &str) -> bool {
        let removed = self.entries().remove(url).is_some();
        trace!(%url, removed, "Revoked object address");
        removed
    }
}

/// Owning handle for one object address. Dropping it releases the address.
pub struct ObjectUrl {
    url: String,
    registry: Arc<ObjectUrlRegistry>,
    revoked: bool,
}

impl ObjectUrl {
    /// The address string
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Resolve the bytes behind this address
    pub fn resolve(&self) -> Option<Arc<[u8]>> {
        self.registry.resolve(&self.url)
    }

    /// MIME type the address was registered with
    pub fn mime(&self) -> Option<String> {
        self.registry.mime_of(&self.url)
    }

    /// Release the address now
    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.revoked {
            self.registry.revoke(&self.url);
            self.revoked = true;
        }
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.release();
    }
}

impl PartialEq for ObjectUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
