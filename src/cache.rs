use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug)]
pub enum CacheError {
    Missing(String),
    IoError(io::Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CacheError {}

impl From<io::Error> for CacheError {
    fn from(e: io::Error) -> Self {
        CacheError::IoError(e)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerdeError(e)
    }
}

/// Key to serialized blob storage.
pub trait CacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn put(&self, key: &str, blob: &[u8]) -> Result<(), CacheError>;
    fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
            None => Ok(None),
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        Self: Sized,
    {
        self.put(key, &serde_json::to_vec(value)?)
    }

    /// Recomputes and stores when `update` is set, otherwise requires a cached value.
    ///
    /// A failed recompute leaves the previous entry in place.
    fn fetch<T, E, F>(&self, key: &str, update: bool, compute: F) -> Result<T, E>
    where
        Self: Sized,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        if update {
            info!("Rebuilding cached {key}");
            let value = compute()?;
            self.store(key, &value)?;
            Ok(value)
        } else {
            debug!("Loading cached {key}");
            self.load(key)?
                .ok_or_else(|| CacheError::Missing(key.to_string()).into())
        }
    }
}

/// JSON files under `<working_dir>/cache/`.
#[derive(Clone, Debug)]
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Self {
        Self {
            root: working_dir.as_ref().join("cache"),
        }
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl CacheStore for FsCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, blob: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path(key), blob)?;
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    blobs: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, blob: &[u8]) -> Result<(), CacheError> {
        self.blobs.borrow_mut().insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}
