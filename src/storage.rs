//! Byte-level record storage.
//!
//! The record store only needs five things from its backing store: list the
//! keys, read one, write one, create one exclusively, and test for existence.
//! [`FsStorage`] keeps one `<key>.json` file per record in a directory;
//! [`MemoryStorage`] keeps them in a map and backs the tests.
//!
//! Keys reaching this layer have already been checked by
//! [`is_valid_id`](crate::article::is_valid_id), so they never contain path
//! separators or dots.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::fs;

const RECORD_EXTENSION: &str = "json";

#[async_trait]
pub trait Storage: Send + Sync {
    /// Every stored key, sorted.
    async fn list(&self) -> io::Result<Vec<String>>;

    /// The record stored under `key`, or `None` when there is none.
    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    async fn exists(&self, key: &str) -> io::Result<bool>;

    /// Stores `bytes` under `key`, replacing any previous record.
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Stores `bytes` under `key` only if the key is free.
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] otherwise. The check and
    /// the write are a single operation.
    async fn create(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

// ── Filesystem ────────────────────────────────────────────────────────────────

/// One file per record in a single directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    /// Uses `dir` as the record directory, creating it if it does not exist.
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{RECORD_EXTENSION}"))
    }

    /// Writes `bytes` to a fresh staging file in the record directory, then
    /// moves it onto `key`'s path. With `replace` unset the move fails with
    /// [`io::ErrorKind::AlreadyExists`] instead of overwriting.
    ///
    /// Staging files are unique per call and never carry the record
    /// extension, so listings ignore them and a failed write leaves nothing
    /// behind.
    async fn stage(&self, key: &str, bytes: &[u8], replace: bool) -> io::Result<()> {
        let dir = self.dir.clone();
        let target = self.path(key);
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut staged = tempfile::Builder::new()
                .prefix(".")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            staged.write_all(&bytes)?;
            staged.as_file().sync_all()?;

            let placed = if replace {
                staged.persist(&target)
            } else {
                staged.persist_noclobber(&target)
            };
            placed.map(drop).map_err(|e| e.error)
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn list(&self) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn exists(&self, key: &str) -> io::Result<bool> {
        fs::try_exists(self.path(key)).await
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.stage(key, bytes, true).await
    }

    async fn create(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.stage(key, bytes, false).await
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Records held in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    fn records(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list(&self) -> io::Result<Vec<String>> {
        Ok(self.records().keys().cloned().collect())
    }

    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.records().get(key).cloned())
    }

    async fn exists(&self, key: &str) -> io::Result<bool> {
        Ok(self.records().contains_key(key))
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.records().insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn create(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let mut records = self.records();
        if records.contains_key(key) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        records.insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    async fn exercise(storage: &dyn Storage) {
        assert!(storage.list().await.unwrap().is_empty());
        assert_eq!(storage.get("b").await.unwrap(), None);

        storage.create("b", b"one").await.unwrap();
        storage.create("a", b"two").await.unwrap();
        assert_eq!(storage.list().await.unwrap(), vec!["a", "b"]);
        assert!(storage.exists("a").await.unwrap());

        let err = storage.create("b", b"clobber").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(storage.get("b").await.unwrap().as_deref(), Some(&b"one"[..]));

        storage.put("b", b"three").await.unwrap();
        assert_eq!(storage.get("b").await.unwrap().as_deref(), Some(&b"three"[..]));
    }

    #[tokio::test]
    async fn memory_storage_semantics() {
        exercise(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn fs_storage_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::open(dir.path()).await.unwrap();
        exercise(&storage).await;
        assert!(dir.path().join("b.json").is_file());
    }

    #[tokio::test]
    async fn fs_storage_creates_missing_directory_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("articulos");
        let storage = FsStorage::open(&nested).await.unwrap();
        assert!(nested.is_dir());

        std::fs::write(nested.join("notes.txt"), "x").unwrap();
        std::fs::write(nested.join("hola.json"), "{}").unwrap();
        assert_eq!(storage.list().await.unwrap(), vec!["hola"]);
    }

    #[tokio::test]
    async fn fs_put_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::open(dir.path()).await.unwrap();
        storage.put("hola", b"{}").await.unwrap();
        storage.put("hola", b"{ }").await.unwrap();
        assert_eq!(file_names(dir.path()), vec!["hola.json"]);
    }

    #[tokio::test]
    async fn fs_create_collision_keeps_record_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::open(dir.path()).await.unwrap();
        storage.create("hola", b"first").await.unwrap();

        let err = storage.create("hola", b"second").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(dir.path().join("hola.json")).unwrap(), b"first");
        assert_eq!(file_names(dir.path()), vec!["hola.json"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_puts_on_one_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FsStorage::open(dir.path()).await.unwrap());
        let long = vec![b'x'; 20 * 1024];
        let short = b"short".to_vec();

        for _ in 0..50 {
            let writers = [long.clone(), short.clone()].map(|bytes| {
                let storage = Arc::clone(&storage);
                tokio::spawn(async move { storage.put("k", &bytes).await })
            });
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let stored = storage.get("k").await.unwrap().unwrap();
            assert!(stored == long || stored == short, "record was mixed: {} bytes", stored.len());
        }
        assert_eq!(file_names(dir.path()), vec!["k.json"]);
    }
}
