use crate::time::{epoch, from_unix_seconds};
use crate::value::Value;
use chrono::{DateTime, FixedOffset, TimeDelta};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// How [`TypedMap::add_map`] takes the lock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Each entry is inserted in its own critical section. Concurrent readers
    /// may observe a partially merged map.
    #[default]
    PerEntry,
    /// The whole merge happens in one critical section.
    Batch,
}

/// A thread-safe map from string keys to dynamically-typed values
///
/// `TypedMap` is meant for data that crosses component boundaries without a
/// shared schema: request contexts, configuration blobs, decoded JSON. Values
/// are stored as given and converted on the way out by the `get_*` family,
/// which never fails: a missing key or an unconvertible value reads as the
/// target type's zero value.
///
/// Every operation takes the internal reader/writer lock for just its own
/// duration, so a map can be shared between threads behind an `Arc`.
///
/// # Examples
///
/// ```
/// use sovran_valuemap::TypedMap;
///
/// let map = TypedMap::new();
/// map.set("retries", "3");
/// map.set("verbose", 1);
///
/// assert_eq!(map.get_i64("retries"), 3);
/// assert!(map.get_bool("verbose"));
/// assert_eq!(map.get_string("missing"), "");
/// ```
#[derive(Debug, Default)]
pub struct TypedMap {
    items: RwLock<HashMap<String, Value>>,
    merge_policy: MergePolicy,
}

impl TypedMap {
    /// Creates a new, empty TypedMap
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how [`add_map`](Self::add_map) locks, returning the map.
    ///
    /// ```
    /// use sovran_valuemap::{MergePolicy, TypedMap};
    ///
    /// let map = TypedMap::new().with_merge_policy(MergePolicy::Batch);
    /// assert_eq!(map.merge_policy(), MergePolicy::Batch);
    /// ```
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Returns the policy [`add_map`](Self::add_map) uses.
    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    /// Creates a map holding a copy of every entry in `source`.
    ///
    /// Only the top level is walked; each value is copied as a whole.
    ///
    /// ```
    /// use sovran_valuemap::{TypedMap, Value};
    /// use std::collections::HashMap;
    ///
    /// let mut decoded = HashMap::new();
    /// decoded.insert("id".to_string(), Value::from(7));
    ///
    /// let map = TypedMap::copy(decoded);
    /// assert_eq!(map.get_i32("id"), 7);
    /// ```
    pub fn copy<I, K, V>(source: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        source.into_iter().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.items.read().unwrap_or_else(|poisoned| {
            tracing::warn!("typed map lock was poisoned, continuing with its contents");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.items.write().unwrap_or_else(|poisoned| {
            tracing::warn!("typed map lock was poisoned, continuing with its contents");
            poisoned.into_inner()
        })
    }

    /// Stores a value, replacing any previous value under the same key.
    pub fn set<K: Into<String>, V: Into<Value>>(&self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        self.write().insert(key, value);
    }

    /// Merges entries into the map, overwriting on key collision.
    ///
    /// Under [`MergePolicy::PerEntry`] each insertion is its own critical
    /// section; under [`MergePolicy::Batch`] the merge is atomic with respect
    /// to other operations. An empty source is a no-op, so an optional
    /// mapping can be passed as `maybe_map.into_iter().flatten()`.
    pub fn add_map<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v.into()));
        match self.merge_policy {
            MergePolicy::PerEntry => {
                for (key, value) in entries {
                    self.write().insert(key, value);
                }
            }
            MergePolicy::Batch => {
                let entries: Vec<(String, Value)> = entries.collect();
                if !entries.is_empty() {
                    self.write().extend(entries);
                }
            }
        }
    }

    /// Retrieves a copy of the raw value stored under `key`.
    ///
    /// Returns `None` when the key is absent. A stored [`Value::Null`] is
    /// returned as `Some(Value::Null)`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Removes a key, returning `true` if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Returns a copy of every entry, safe to iterate without holding the lock.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.read().clone()
    }

    /// Replaces every entry in one critical section.
    pub(crate) fn replace(&self, entries: HashMap<String, Value>) {
        *self.write() = entries;
    }

    /// Runs `f` on the entries while holding the read lock.
    pub(crate) fn with_entries<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HashMap<String, Value>) -> R,
    {
        f(&self.read())
    }

    /// Returns the number of entries in the map
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the map contains no entries
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns true if the map contains `key`, even when it holds
    /// [`Value::Null`].
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Returns every key, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Returns the nested map stored under `key` as an independent TypedMap.
    ///
    /// If the key is absent or holds anything other than a map, the result
    /// is a new empty map. Changes to the returned map never reach `self`.
    ///
    /// ```
    /// use sovran_valuemap::TypedMap;
    ///
    /// let map = TypedMap::from_json(br#"{"db": {"host": "localhost", "port": 5432}}"#)?;
    /// let db = map.get_sub_map("db");
    /// assert_eq!(db.get_i64("port"), 5432);
    ///
    /// db.set("port", 6543);
    /// assert_eq!(map.get_sub_map("db").get_i64("port"), 5432);
    /// assert!(map.get_sub_map("nope").is_empty());
    /// # Ok::<(), sovran_valuemap::MapError>(())
    /// ```
    pub fn get_sub_map(&self, key: &str) -> TypedMap {
        let nested = match self.read().get(key) {
            Some(Value::Map(members)) => members.clone(),
            _ => HashMap::new(),
        };
        TypedMap {
            items: RwLock::new(nested),
            merge_policy: self.merge_policy,
        }
    }

    /// Looks `key` up and converts its value under the read lock.
    ///
    /// `convert` reports a miss as `None`; misses on present, non-null values
    /// are traced so a silently defaulted field can be tracked down.
    fn coerce<T>(
        &self,
        key: &str,
        target: &'static str,
        convert: fn(&Value) -> Option<T>,
    ) -> Option<T> {
        let guard = self.read();
        let value = guard.get(key).filter(|v| !v.is_null())?;
        let converted = convert(value);
        if converted.is_none() {
            tracing::trace!(key, kind = value.kind(), wanted = target, "value not coercible");
        }
        converted
    }

    /// Reads `key` as a float; see [`Value::coerce_f64`].
    pub fn get_f64(&self, key: &str) -> f64 {
        self.coerce(key, "f64", Value::try_f64).unwrap_or_default()
    }

    /// Reads `key` as a 64-bit integer; see [`Value::coerce_i64`].
    pub fn get_i64(&self, key: &str) -> i64 {
        self.coerce(key, "i64", Value::try_i64).unwrap_or_default()
    }

    /// Reads `key` as a 32-bit integer; see [`Value::coerce_i32`].
    pub fn get_i32(&self, key: &str) -> i32 {
        self.get_i64(key) as i32
    }

    /// Reads `key` as text; see [`Value::coerce_string`].
    pub fn get_string(&self, key: &str) -> String {
        self.coerce(key, "string", Value::try_string).unwrap_or_default()
    }

    /// Reads `key` as a boolean; see [`Value::coerce_bool`].
    ///
    /// ```
    /// use sovran_valuemap::TypedMap;
    ///
    /// let map = TypedMap::new();
    /// map.set("form_field", "T");
    /// map.set("count", 0);
    ///
    /// assert!(map.get_bool("form_field"));
    /// assert!(!map.get_bool("count"));
    /// assert!(!map.get_bool("missing"));
    /// ```
    pub fn get_bool(&self, key: &str) -> bool {
        self.coerce(key, "bool", Value::try_bool).unwrap_or_default()
    }

    /// Reads `key` as a timestamp, falling back to the Unix epoch.
    ///
    /// Strings are parsed as RFC3339 and numbers are whole seconds since the
    /// epoch.
    pub fn get_time(&self, key: &str) -> DateTime<FixedOffset> {
        self.coerce(key, "time", Value::try_time).unwrap_or_else(epoch)
    }

    /// Reads `key` as a duration, falling back to zero.
    ///
    /// Numbers are nanoseconds, which is how durations are written to JSON.
    /// Strings use the `1h2m3.5s` form.
    pub fn get_duration(&self, key: &str) -> TimeDelta {
        self.coerce(key, "duration", Value::try_duration)
            .unwrap_or_else(TimeDelta::zero)
    }

    /// Reads `key` as a timestamp and returns it as epoch milliseconds.
    ///
    /// Only whole seconds are kept, so the result is always a multiple of
    /// 1000.
    pub fn get_epoch_millis(&self, key: &str) -> i64 {
        self.get_time(key).timestamp() * 1000
    }

    /// Stores epoch milliseconds as a UTC timestamp, discarding the
    /// sub-second part (the division truncates toward zero, so `-1500`
    /// becomes second `-1`).
    ///
    /// ```
    /// use sovran_valuemap::TypedMap;
    ///
    /// let map = TypedMap::new();
    /// map.set_epoch_millis("seen", 306_999_300_999);
    /// assert_eq!(map.get_epoch_millis("seen"), 306_999_300_000);
    /// assert_eq!(map.get_string("seen"), "1979-09-24T05:35:00Z");
    /// ```
    pub fn set_epoch_millis(&self, key: &str, millis: i64) {
        self.set(key, from_unix_seconds(millis / 1000));
    }
}

impl Clone for TypedMap {
    /// Produces an independent map with its own lock.
    fn clone(&self) -> Self {
        TypedMap {
            items: RwLock::new(self.snapshot()),
            merge_policy: self.merge_policy,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TypedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let items: HashMap<String, Value> =
            iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        TypedMap {
            items: RwLock::new(items),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl From<HashMap<String, Value>> for TypedMap {
    fn from(source: HashMap<String, Value>) -> Self {
        TypedMap {
            items: RwLock::new(source),
            merge_policy: MergePolicy::default(),
        }
    }
}

impl From<Option<HashMap<String, Value>>> for TypedMap {
    fn from(source: Option<HashMap<String, Value>>) -> Self {
        source.map(TypedMap::from).unwrap_or_default()
    }
}

impl From<TypedMap> for Value {
    fn from(map: TypedMap) -> Self {
        let entries = map
            .items
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Value::Map(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let map = TypedMap::new();
        assert!(map.is_empty());

        map.set("key", 42);
        assert!(map.contains_key("key"));
        assert_eq!(map.get("key"), Some(Value::Int(42)));
        assert_eq!(map.len(), 1);

        map.set("key", "replaced");
        assert_eq!(map.get("key"), Some(Value::from("replaced")));
        assert_eq!(map.len(), 1);

        assert!(map.remove("key"));
        assert!(!map.remove("key"));
        assert_eq!(map.get("key"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_null_is_present_but_reads_as_missing() {
        let map = TypedMap::new();
        map.set("nothing", Value::Null);

        assert!(map.contains_key("nothing"));
        assert_eq!(map.get("nothing"), Some(Value::Null));
        assert_eq!(map.get_i64("nothing"), 0);
        assert_eq!(map.get_time("nothing"), epoch());
    }

    #[test]
    fn test_add_map_overwrites() {
        for policy in [MergePolicy::PerEntry, MergePolicy::Batch] {
            let map = TypedMap::new().with_merge_policy(policy);
            map.set("a", 1);
            map.set("b", 2);

            map.add_map([("b", Value::from(20)), ("c", Value::from(30))]);

            assert_eq!(map.len(), 3);
            assert_eq!(map.get_i64("a"), 1);
            assert_eq!(map.get_i64("b"), 20);
            assert_eq!(map.get_i64("c"), 30);
        }
    }

    #[test]
    fn test_add_map_absent_source_is_noop() {
        let map = TypedMap::new();
        map.set("a", 1);

        let absent: Option<HashMap<String, Value>> = None;
        map.add_map(absent.into_iter().flatten());

        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let map = TypedMap::new();
        map.set("a", 1);

        let mut snapshot = map.snapshot();
        snapshot.insert("b".to_string(), Value::from(2));
        map.set("c", 3);

        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_key("c"));
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn test_clone_is_independent() {
        let map = TypedMap::new().with_merge_policy(MergePolicy::Batch);
        map.set("a", 1);

        let copy = map.clone();
        copy.set("a", 2);

        assert_eq!(map.get_i64("a"), 1);
        assert_eq!(copy.get_i64("a"), 2);
        assert_eq!(copy.merge_policy(), MergePolicy::Batch);
    }

    #[test]
    fn test_sub_map_fallbacks() {
        let map = TypedMap::new();
        map.set("scalar", "not a map");

        let missing = map.get_sub_map("missing");
        assert!(missing.is_empty());
        missing.set("usable", true);
        assert!(missing.get_bool("usable"));

        assert!(map.get_sub_map("scalar").is_empty());
    }

    #[test]
    fn test_sub_map_inherits_policy() {
        let map = TypedMap::new().with_merge_policy(MergePolicy::Batch);
        map.set("inner", Value::from(TypedMap::copy([("x", 1)])));

        let inner = map.get_sub_map("inner");
        assert_eq!(inner.get_i64("x"), 1);
        assert_eq!(inner.merge_policy(), MergePolicy::Batch);
    }

    #[test]
    fn test_epoch_millis_truncates_sub_second() {
        let map = TypedMap::new();
        map.set_epoch_millis("t", 1_500);
        assert_eq!(map.get_time("t").timestamp(), 1);

        map.set_epoch_millis("t", -1_500);
        assert_eq!(map.get_time("t").timestamp(), -1);

        map.set_epoch_millis("t", -999);
        assert_eq!(map.get_time("t").timestamp(), 0);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let map = Arc::new(TypedMap::new());
        map.set("kept", 1);

        let poisoner = Arc::clone(&map);
        let result = thread::spawn(move || {
            let _guard = poisoner.items.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(map.get_i64("kept"), 1);
        map.set("after", 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_batch_merge_is_never_observed_partially() {
        let map = Arc::new(TypedMap::new().with_merge_policy(MergePolicy::Batch));
        let barrier = Arc::new(Barrier::new(2));
        let batch: Vec<(String, i64)> = (0..500).map(|i| (format!("k{i}"), i)).collect();

        let writer = {
            let map = Arc::clone(&map);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                map.add_map(batch);
            })
        };

        barrier.wait();
        for _ in 0..1_000 {
            let len = map.len();
            assert!(len == 0 || len == 500, "observed partial merge of {len}");
        }
        writer.join().unwrap();
        assert_eq!(map.len(), 500);
    }
}
