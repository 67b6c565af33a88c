use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Monotonic per-id ticket handed out when a transformation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

struct Entry<V> {
    latest: u64,
    value: Option<V>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            latest: 0,
            value: None,
        }
    }
}

/// Transformed content keyed by subsection or module id.
///
/// A newer payload for an id always supersedes an older one: `begin` issues
/// a fresh token, and `complete` only stores a value whose token is still
/// the latest for that id. Stored values are replaced wholesale.
pub struct ContentCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V> Default for ContentCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> ContentCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        // Entries stay consistent across a panicking holder: every update is
        // a single field store.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, id: &str) -> RequestToken {
        let mut entries = self.lock();
        let entry = entries.entry(id.to_string()).or_default();
        entry.latest += 1;
        RequestToken(entry.latest)
    }

    pub fn is_current(&self, id: &str, token: RequestToken) -> bool {
        self.lock().get(id).is_some_and(|e| e.latest == token.0)
    }

    /// Store `value` if `token` is still the latest issued for `id`.
    /// Returns false, and drops the value, for a stale result.
    pub fn complete(&self, id: &str, token: RequestToken, value: V) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(id) {
            Some(entry) if entry.latest == token.0 => {
                entry.value = Some(value);
                true
            }
            _ => {
                debug!(id, token = token.0, "discarding stale transformation result");
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<V> {
        self.lock().get(id).and_then(|e| e.value.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().get(id).is_some_and(|e| e.value.is_some())
    }

    /// Drop the stored value. Tokens already issued stay valid, so an
    /// in-flight request can still land.
    pub fn invalidate(&self, id: &str) -> Option<V> {
        self.lock().get_mut(id).and_then(|e| e.value.take())
    }

    pub fn len(&self) -> usize {
        self.lock().values().filter(|e| e.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
