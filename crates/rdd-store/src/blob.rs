//! # The Blob-Store Abstraction
//!
//! Both the query cache and the report store are built exclusively on this
//! interface. Paths are `/`-separated keys relative to the store root; the
//! local backend maps them onto the filesystem, the in-memory backend onto
//! a sorted map. `list` supports `*` wildcards within one path segment —
//! enough for the snapshot-globbing the report store needs.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;

use rdd_core::StoreError;

/// A pluggable key-value blob store.
pub trait BlobStore: Send + Sync {
    /// Read a blob. `Ok(None)` when the key does not exist.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a blob, creating parent directories as needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// List keys directly under `dir` whose file name matches `pattern`
    /// (`*` wildcards). Returns bare file names, sorted.
    fn list(&self, dir: &str, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Whether the key exists.
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Delete a blob. Deleting a missing key is not an error.
    fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Ensure a directory key exists (no-op for backends without dirs).
    fn create_dir_all(&self, path: &str) -> Result<(), StoreError>;
}

/// Match a file name against a `*`-wildcard pattern.
pub(crate) fn glob_match(pattern: &str, name: &str) -> bool {
    fn inner(p: &[u8], n: &[u8]) -> bool {
        match (p.first(), n.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                inner(&p[1..], n) || (!n.is_empty() && inner(p, &n[1..]))
            }
            (Some(pc), Some(nc)) if pc == nc => inner(&p[1..], &n[1..]),
            _ => false,
        }
    }
    inner(pattern.as_bytes(), name.as_bytes())
}

// ---------------------------------------------------------------------------
// LocalBlobStore
// ---------------------------------------------------------------------------

/// Filesystem-backed blob store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `base`. The directory is created lazily on
    /// first write.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn full(&self, path: &str) -> PathBuf {
        let mut full = self.base.clone();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            full.push(segment);
        }
        full
    }
}

impl BlobStore for LocalBlobStore {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let full = self.full(path);
        match fs::read(&full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(full.display().to_string(), err)),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let full = self.full(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| StoreError::io(parent.display().to_string(), err))?;
        }
        fs::write(&full, bytes).map_err(|err| StoreError::io(full.display().to_string(), err))
    }

    fn list(&self, dir: &str, pattern: &str) -> Result<Vec<String>, StoreError> {
        let full = self.full(dir);
        if !full.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&full)
            .map_err(|err| StoreError::io(full.display().to_string(), err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(full.display().to_string(), err))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_file() && glob_match(pattern, &name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.full(path).exists())
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        let full = self.full(path);
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(full.display().to_string(), err)),
        }
    }

    fn create_dir_all(&self, path: &str) -> Result<(), StoreError> {
        let full = self.full(path);
        fs::create_dir_all(&full).map_err(|err| StoreError::io(full.display().to_string(), err))
    }
}

// ---------------------------------------------------------------------------
// MemoryBlobStore
// ---------------------------------------------------------------------------

/// In-memory blob store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// An empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(path: &str) -> String {
        path.split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.read().get(&Self::normalize(path)).cloned())
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.blobs
            .write()
            .insert(Self::normalize(path), bytes.to_vec());
        Ok(())
    }

    fn list(&self, dir: &str, pattern: &str) -> Result<Vec<String>, StoreError> {
        let prefix = {
            let d = Self::normalize(dir);
            if d.is_empty() {
                d
            } else {
                format!("{d}/")
            }
        };
        let blobs = self.blobs.read();
        let mut names: Vec<String> = blobs
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .filter(|name| glob_match(pattern, name))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.blobs.read().contains_key(&Self::normalize(path)))
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.blobs.write().remove(&Self::normalize(path));
        Ok(())
    }

    fn create_dir_all(&self, _path: &str) -> Result<(), StoreError> {
        Ok(())
    }
}
