//! Key-value persistence, string in and string out.

use std::collections::BTreeMap;

/// Prefix for every key the calculator owns.
pub const NAMESPACE: &str = "doughcalc_";

/// Key for the last shown wizard step.
pub const CURRENT_STEP_KEY: &str = "currentStep";

/// A flat string store, e.g. browser local storage or a JSON file.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    /// All keys currently held, in any order.
    fn keys(&self) -> Vec<String>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Wraps a store so callers use bare keys while the backing store sees
/// them under [`NAMESPACE`]. Foreign keys are never touched.
#[derive(Clone, Debug, Default)]
pub struct Namespaced<S> {
    inner: S,
}

impl<S: KeyValueStore> Namespaced<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn full(key: &str) -> String {
        format!("{NAMESPACE}{key}")
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(&Self::full(key))
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.inner.set(&Self::full(key), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(&Self::full(key));
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v == "true")
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    /// Namespaced keys, without the prefix.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(NAMESPACE).map(str::to_string))
            .collect()
    }

    /// Remove every namespaced key.
    pub fn clear(&mut self) {
        for key in self.keys() {
            self.remove(&key);
        }
    }
}
