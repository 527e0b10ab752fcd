use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

/// Durable string-keyed storage.
///
/// Synchronous and single-context: callers never hold more than one
/// outstanding operation, so implementations need no internal queuing.
pub trait KeyValueStore {
    /// Read the raw value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).set(key, value)
    }
}

/// In-memory store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read a typed value from `store`.
///
/// A missing entry or one that does not parse as `T` yields `default`, and
/// the store is initialized with it.
pub fn read<T, S>(store: &S, key: &str, default: T) -> Result<T, Error>
where
    T: Serialize + DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => warn!("Discarding malformed {} entry: {}", key, e),
        },
        None => debug!("No {} entry, initializing with default", key),
    }

    write(store, key, &default)?;
    Ok(default)
}

/// Serialize `value` and overwrite the entry under `key`.
pub fn write<T, S>(store: &S, key: &str, value: &T) -> Result<(), Error>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", key, e)))?;
    store.set(key, &json)
}

/// An in-memory value bound to a store key; every mutation is written back
/// before the call returns.
#[derive(Debug)]
pub struct Persisted<T> {
    key: String,
    value: T,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Load the value under `key`, falling back to `default` (see [`read`]).
    pub fn load<S>(store: &S, key: impl Into<String>, default: T) -> Result<Self, Error>
    where
        S: KeyValueStore + ?Sized,
    {
        let key = key.into();
        let value = read(store, &key, default)?;
        Ok(Self { key, value })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Apply `f` and write the result back unconditionally.
    pub fn update<S, R>(&mut self, store: &S, f: impl FnOnce(&mut T) -> R) -> Result<R, Error>
    where
        S: KeyValueStore + ?Sized,
    {
        let out = f(&mut self.value);
        write(store, &self.key, &self.value)?;
        Ok(out)
    }

    /// Apply `f` and write back only if it reports a change.
    pub fn modify<S>(&mut self, store: &S, f: impl FnOnce(&mut T) -> bool) -> Result<bool, Error>
    where
        S: KeyValueStore + ?Sized,
    {
        let changed = f(&mut self.value);
        if changed {
            write(store, &self.key, &self.value)?;
        }
        Ok(changed)
    }
}
