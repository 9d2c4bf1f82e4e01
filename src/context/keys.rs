use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type Value = Arc<dyn Any + Send + Sync>;

/// A request-scoped key/value store.
///
/// This is used to pass data between handlers of the same request.  Keys are
/// plain strings, so two unrelated handlers using the same key will clobber
/// each other; namespace keys (e.g. `"auth.user"`) to avoid that.  Values are
/// retrieved by type, and a lookup with the wrong type behaves as if the key
/// were missing.
///
/// The store is cheaply cloneable, and every clone refers to the same data,
/// so a handle can be moved into background work spawned by a handler.  Reads
/// and writes are guarded by a read/write lock.
///
/// # Examples
/// ```rust
/// # use thicket::Keys;
/// let keys = Keys::default();
/// keys.set("user.id", 42u32);
/// assert_eq!(keys.get::<u32>("user.id").as_deref(), Some(&42));
/// assert!(keys.get::<String>("user.id").is_none());
/// ```
#[derive(Clone, Default)]
pub struct Keys(Arc<RwLock<HashMap<String, Value>>>);

impl Keys {
    /// Stores a value under the given key, replacing any previous value.
    pub fn set<K, T>(&self, key: K, value: T)
    where
        K: Into<String>,
        T: Any + Send + Sync,
    {
        self.0.write().insert(key.into(), Arc::new(value));
    }

    /// Retrieves the value under the given key, if it exists and has the
    /// requested type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.0.read().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Whether a value exists under the given key, regardless of its type.
    pub fn contains(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Removes the value under the given key, returning whether there was
    /// one.
    pub fn remove(&self, key: &str) -> bool {
        self.0.write().remove(key).is_some()
    }

    /// The number of stored values.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.0.read();
        f.debug_set().entries(map.keys()).finish()
    }
}
