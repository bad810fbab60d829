//! Request-keyed caches where concurrent identical requests share one
//! computation.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A memo table whose entries are computed at most once.
///
/// The first caller for a key runs the computation; callers arriving while
/// it runs block on the same cell and receive a clone of its value. Distinct
/// keys never wait on each other: the table lock is only held long enough
/// to fetch or create a cell.
///
/// A computation must not request its own key again, or it will deadlock.
///
/// # Examples
///
/// ```
/// use fleetcfg::cache::SingleFlight;
///
/// let cache: SingleFlight<&str, usize> = SingleFlight::new();
/// assert_eq!(cache.get_or_compute("billing", || 7), 7);
/// assert_eq!(cache.get_or_compute("billing", || unreachable!()), 7);
/// ```
#[derive(Debug)]
pub struct SingleFlight<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceLock<V>>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, computing it with `compute` if
    /// this is the first request.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_init(compute).clone()
    }

    /// Number of keys requested so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
