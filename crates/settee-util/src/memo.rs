use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// Thread-safe memo table for an expensive keyed computation.
///
/// The computation runs outside the lock, so two threads missing on the
/// same key at once may both compute it; the first result stored wins.
pub struct Memoized<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Memoized<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&self, key: &K, f: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(v) = self.get(key) {
            return v;
        }
        let value = f(key);
        self.entries
            .write()
            .expect("lock poisoned")
            .entry(key.clone())
            .or_insert(value)
            .clone()
    }

    /// Like [`Memoized::get_or_compute`]; errors are returned and not cached.
    pub fn get_or_try_compute<F, E>(&self, key: &K, f: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        let value = f(key)?;
        Ok(self
            .entries
            .write()
            .expect("lock poisoned")
            .entry(key.clone())
            .or_insert(value)
            .clone())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().expect("lock poisoned").get(key).cloned()
    }

    /// Drop one cached entry.
    pub fn forget(&self, key: &K) -> Option<V> {
        self.entries.write().expect("lock poisoned").remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for Memoized<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for Memoized<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.read().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("Memoized").field("entries", &len).finish()
    }
}
