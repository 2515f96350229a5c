// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! strata-config: JSON config service over a pluggable storage port.
//!
//! Engine crates define their knobs as `serde` structs; this crate only moves
//! them in and out of a [`ConfigStore`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod fs;
mod memory;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use fs::FsConfigStore;
pub use memory::MemoryConfigStore;

/// Where engine and harness settings live between runs.
///
/// A store only moves bytes; [`ConfigService`] owns the JSON encoding. Keys
/// are flat names such as `"engine"`.
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("no config stored under {key:?}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },
    /// The filesystem store could not read or write.
    #[error("config storage: {0}")]
    Io(#[from] std::io::Error),
    /// The stored JSON does not match the settings type.
    #[error("config json: {0}")]
    Serde(#[from] serde_json::Error),
    /// The key cannot name a stored entry.
    #[error("invalid config key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// JSON front end over a [`ConfigStore`].
#[derive(Debug, Default)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize the value stored under `key`.
    ///
    /// Missing keys and empty blobs yield `Ok(None)` so callers can fall
    /// back to defaults.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`ConfigService::load`], substituting `T::default()` when the
    /// key is missing.
    pub fn load_or_default<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Serialize `value` as pretty JSON and persist it under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}
