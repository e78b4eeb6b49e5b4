//! Lock-guarded hash map shared across tasks.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;


/// A thread-safe map handing out cloned values.
///
/// Cloning the map shares the underlying storage. Reads take a shared lock,
/// writes an exclusive one; iteration walks a snapshot so callbacks never run
/// under the lock.
#[derive(Clone)]
pub struct ConcurrentMap<K, V> {
  inner: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> ConcurrentMap<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  /// Creates an empty map.
  #[must_use]
  pub fn new() -> Self {
    Self { inner: Arc::new(RwLock::new(HashMap::new())) }
  }

  /// Returns a clone of the value stored under `key`.
  #[must_use]
  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized, {
    self.inner.read().get(key).cloned()
  }

  /// Returns whether `key` is present.
  #[must_use]
  pub fn has<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized, {
    self.inner.read().contains_key(key)
  }

  /// Stores `value` under `key`, replacing any previous value.
  pub fn set(&self, key: K, value: V) {
    self.inner.write().insert(key, value);
  }

  /// Removes the value stored under `key`, returning it when present.
  pub fn delete<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized, {
    self.inner.write().remove(key)
  }

  /// Returns the existing value under `key`, or stores `value` when absent.
  ///
  /// The boolean is `true` when the value was already present.
  pub fn get_or_set(&self, key: K, value: V) -> (V, bool) {
    let mut guard = self.inner.write();
    match guard.get(&key) {
      | Some(existing) => (existing.clone(), true),
      | None => {
        guard.insert(key, value.clone());
        (value, false)
      },
    }
  }

  /// Returns the number of entries.
  #[must_use]
  pub fn len(&self) -> usize {
    self.inner.read().len()
  }

  /// Returns whether the map is empty.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.inner.read().is_empty()
  }

  /// Walks a snapshot of the entries, stopping when `f` returns `false`.
  pub fn range<F>(&self, mut f: F)
  where
    F: FnMut(&K, &V) -> bool, {
    let snapshot: Vec<(K, V)> = self.inner.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (key, value) in &snapshot {
      if !f(key, value) {
        break;
      }
    }
  }

  /// Removes and returns every entry.
  #[must_use]
  pub fn drain(&self) -> Vec<(K, V)> {
    self.inner.write().drain().collect()
  }
}

impl<K, V> Default for ConcurrentMap<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  fn default() -> Self {
    Self::new()
  }
}
