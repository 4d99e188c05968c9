//! Filesystem storage backend.
//!
//! One file per key under `<root>/<namespace>/<key>.bin`. Writes go
//! through a temp file and an atomic rename, so a power cut mid-write
//! leaves either the old blob or the new one, never a torn record,
//! matching the atomicity the port contract demands.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

const CONFIG_NAMESPACE: &str = "config";
const CONFIG_KEY: &str = "system";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> std::io::Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    fn path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{key}.bin"))
    }
}

impl StoragePort for FileStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = match fs::read(self.path(namespace, key)) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound)
            }
            Err(_) => return Err(StorageError::IoError),
        };
        if data.len() > buf.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path(namespace, key);
        let dir = path.parent().ok_or(StorageError::IoError)?;
        fs::create_dir_all(dir).map_err(|_| StorageError::IoError)?;

        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(|_| StorageError::IoError)?;
        file.write_all(data).map_err(|_| StorageError::IoError)?;
        file.sync_all().map_err(|_| StorageError::IoError)?;
        fs::rename(&tmp, &path).map_err(|_| StorageError::IoError)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(namespace, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.path(namespace, key).exists()
    }
}

impl ConfigPort for FileStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let data = match fs::read(self.path(CONFIG_NAMESPACE, CONFIG_KEY)) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SystemConfig::default())
            }
            Err(_) => return Err(ConfigError::IoError),
        };
        postcard::from_bytes(&data).map_err(|_| ConfigError::Corrupted)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let data = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        // Same atomic temp-and-rename path as raw blobs.
        let path = self.path(CONFIG_NAMESPACE, CONFIG_KEY);
        let dir = path.parent().ok_or(ConfigError::IoError)?;
        fs::create_dir_all(dir).map_err(|_| ConfigError::IoError)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &data).map_err(|_| ConfigError::IoError)?;
        fs::rename(&tmp, &path).map_err(|_| ConfigError::IoError)
    }
}
