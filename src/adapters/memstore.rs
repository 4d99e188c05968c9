//! In-memory storage backend.
//!
//! Backs tests and the simulated node. Implements both the raw blob
//! store and the config port; config blobs go through the same postcard
//! encoding the file backend uses, so the two are interchangeable.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::app::ports::{ConfigError, ConfigPort, StoragePort};
use crate::config::SystemConfig;

const CONFIG_NAMESPACE: &str = "config";
const CONFIG_KEY: &str = "system";

#[derive(Default)]
pub struct MemStore {
    // RefCell so the read-only config port can persist through &self.
    blobs: RefCell<HashMap<(String, String), Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemStore {
    fn read(
        &self,
        namespace: &str,
        key: &str,
        buf: &mut [u8],
    ) -> Result<usize, crate::app::ports::StorageError> {
        let blobs = self.blobs.borrow();
        let data = blobs
            .get(&(namespace.to_string(), key.to_string()))
            .ok_or(crate::app::ports::StorageError::NotFound)?;
        if data.len() > buf.len() {
            return Err(crate::app::ports::StorageError::BufferTooSmall);
        }
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    fn write(
        &mut self,
        namespace: &str,
        key: &str,
        data: &[u8],
    ) -> Result<(), crate::app::ports::StorageError> {
        self.blobs
            .borrow_mut()
            .insert((namespace.to_string(), key.to_string()), data.to_vec());
        Ok(())
    }

    fn delete(
        &mut self,
        namespace: &str,
        key: &str,
    ) -> Result<(), crate::app::ports::StorageError> {
        self.blobs
            .borrow_mut()
            .remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.blobs
            .borrow()
            .contains_key(&(namespace.to_string(), key.to_string()))
    }
}

impl ConfigPort for MemStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let blobs = self.blobs.borrow();
        let Some(data) = blobs.get(&(CONFIG_NAMESPACE.to_string(), CONFIG_KEY.to_string()))
        else {
            return Ok(SystemConfig::default());
        };
        postcard::from_bytes(data).map_err(|_| ConfigError::Corrupted)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let data = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.blobs
            .borrow_mut()
            .insert((CONFIG_NAMESPACE.to_string(), CONFIG_KEY.to_string()), data);
        Ok(())
    }
}
