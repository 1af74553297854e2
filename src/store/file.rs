//! JSON file backed result store.
//!
//! The whole store is one JSON object keyed by record key. Each upsert is a
//! read → merge → write-temp → rename cycle, so readers only ever observe a
//! complete file and keys written by other callers are carried over.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{PersistenceError, ResultRecord, ResultStore};

/// How long an upsert waits for another process to release the lock.
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY: Duration = Duration::from_millis(20);

/// A store persisted as a single JSON object file.
///
/// Writers in this process are serialized by a mutex; writers in other
/// processes by an advisory lock on a `<file>.lock` sibling. The file is replaced
/// atomically and, on Unix, created with owner-only permissions.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// Exclusive advisory lock on the `<file>.lock` sibling.
///
/// The kernel drops the lock when the handle closes, including when the
/// holding process dies, so a leftover lock file never blocks later writers.
/// The file itself stays on disk.
struct LockFile {
    _file: File,
}

impl LockFile {
    fn acquire(path: PathBuf) -> Result<Self, PersistenceError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { _file: file }),
                Err(e) if is_contended(&e) => {
                    if Instant::now() >= deadline {
                        warn!(path = %path.display(), "lock still held by another writer");
                        return Err(PersistenceError::Locked { path });
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(source) => return Err(PersistenceError::Io { path, source }),
            }
        }
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl JsonFileStore {
    /// Opens a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Reads the current object. A missing or blank file is an empty store;
    /// anything that is not a JSON object is an error, so it is never
    /// overwritten with a map that lost its contents.
    fn read_map(&self) -> Result<Map<String, Value>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(PersistenceError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), PersistenceError> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir()).map_err(|e| self.io_error(e))?;
        serde_json::to_writer_pretty(&mut tmp, map)?;
        tmp.write_all(b"\n").map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

impl ResultStore for JsonFileStore {
    fn upsert(&self, key: &str, record: &ResultRecord) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();
        let _lock = LockFile::acquire(self.lock_path())?;

        let mut map = self.read_map()?;
        let replaced = map
            .insert(key.to_string(), serde_json::to_value(record)?)
            .is_some();
        self.write_map(&map)?;

        debug!(
            path = %self.path.display(),
            key,
            replaced,
            total = map.len(),
            "store updated"
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<ResultRecord>, PersistenceError> {
        match self.read_map()?.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}
