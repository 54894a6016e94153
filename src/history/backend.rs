/* src/history/backend.rs */

use crate::error::BackendError;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Key-value medium the history store persists into.
///
/// Implementations report a full medium as [`BackendError::QuotaExceeded`]
/// and everything else as some other variant.
pub trait KvBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError>;
    fn delete(&mut self, key: &str) -> Result<(), BackendError>;
    /// All keys in ascending order.
    fn keys(&self) -> Result<Vec<String>, BackendError>;
}

/// In-process backend with an optional byte quota over all stored values.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        if let Some(quota) = self.quota {
            let replaced = self.entries.get(key).map_or(0, Vec::len);
            if self.used_bytes() - replaced + value.len() > quota {
                return Err(BackendError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), BackendError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BackendError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(classify)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BackendError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(BackendError::Unavailable(format!("invalid key {key:?}")));
        }
        Ok(self.root.join(key))
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        let path = self.path_for(key)?;
        // dot-prefixed names are never valid keys, so staging can't clobber one
        let staging = self.root.join(format!(".{key}.tmp"));
        let written = fs::write(&staging, value).and_then(|_| fs::rename(&staging, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(classify(e));
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), BackendError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(classify)? {
            let entry = entry.map_err(classify)?;
            if !entry.file_type().map_err(classify)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn classify(err: io::Error) -> BackendError {
    match err.kind() {
        ErrorKind::StorageFull => BackendError::QuotaExceeded,
        _ => BackendError::Io(err),
    }
}
