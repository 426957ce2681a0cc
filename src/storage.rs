/**
 * Key-value storage backends for the learner's history and rotation state.
 *
 * Every structure the engine keeps is stored as a JSON document under a fixed key. The
 * typed helpers at the bottom of this module are deliberately forgiving: a missing or
 * corrupted document reads as an empty default, and a failed write is logged and then
 * dropped, so a storage hiccup never interrupts a quiz.
 */
use std::cell::RefCell;
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;


/// The fixed keys that the engine reads and writes.
pub mod keys {
    pub const QUIZ_HISTORY: &str = "dm_quiz_history";
    pub const CATEGORY_STATS: &str = "dm_category_stats";
    pub const MODULE_PROGRESS: &str = "dm_module_progress";
    pub const AVOID_IDS: &str = "dm_avoid_ids";
    pub const SR_QUEUE: &str = "dm_sr_queue";
    pub const RECENT_WRONGS: &str = "dm_recent_wrongs";
}


#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Sql(rusqlite::Error),
    Json(serde_json::Error),
}


impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StorageError::Io(ref err) => write!(f, "IO error ({})", err),
            StorageError::Sql(ref err) => write!(f, "SQL error ({})", err),
            StorageError::Json(ref err) => write!(f, "could not parse JSON ({})", err),
        }
    }
}


impl error::Error for StorageError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            StorageError::Io(ref err) => Some(err),
            StorageError::Sql(ref err) => Some(err),
            StorageError::Json(ref err) => Some(err),
        }
    }
}


/// A string-valued key-value store.
///
/// Methods take `&self` so that a single backend can be shared by reference between
/// the rotation ledger and the performance store. `get` returns `Ok(None)` when the
/// key has never been written.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}


impl<'a, S: Storage + ?Sized> Storage for &'a S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}


/// In-process storage, mostly useful for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}


impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}


impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}


/// Stores each key as `<key>.json` in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}


impl JsonFileStorage {
    /// Open the storage rooted at `dir`, creating the directory if it does not exist.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(StorageError::Io)?;
        }
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.dir.clone();
        path.push(format!("{}.json", key));
        path
    }
}


impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value).map_err(StorageError::Io)
    }
}


/// Stores every key as a row of a single SQLite table.
pub struct SqliteStorage {
    connection: Connection,
}


impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let connection = Connection::open(path).map_err(StorageError::Sql)?;
        Self::with_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let connection = Connection::open_in_memory().map_err(StorageError::Sql)?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, StorageError> {
        connection
            .execute(
                "
            CREATE TABLE IF NOT EXISTS kv(
              key TEXT NOT NULL PRIMARY KEY CHECK(key != ''),
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
                [],
            )
            .map_err(StorageError::Sql)?;
        Ok(Self { connection })
    }
}


impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.connection
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(StorageError::Sql)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.connection
            .execute(
                "INSERT OR REPLACE INTO kv(key, value, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)",
                params![key, value],
            )
            .map(|_| ())
            .map_err(StorageError::Sql)
    }
}


/// Read and parse the document stored under `key`.
///
/// `Ok(None)` means the key was never written; `Err(_)` means it could not be read or
/// did not parse.
pub fn read_json<S, T>(storage: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: Storage + ?Sized,
    T: DeserializeOwned,
{
    match storage.get(key)? {
        Some(data) => serde_json::from_str(&data).map(Some).map_err(StorageError::Json),
        None => Ok(None),
    }
}


/// Like `read_json`, but any failure reads as `T::default()`.
pub fn load_or_default<S, T>(storage: &S, key: &str) -> T
where
    S: Storage + ?Sized,
    T: DeserializeOwned + Default,
{
    match read_json(storage, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!("discarding unreadable '{}': {}", key, e);
            T::default()
        }
    }
}


/// Serialize `value` and store it under `key`. Failures are logged and swallowed.
pub fn save_best_effort<S, T>(storage: &S, key: &str, value: &T)
where
    S: Storage + ?Sized,
    T: Serialize,
{
    let result = serde_json::to_string(value)
        .map_err(StorageError::Json)
        .and_then(|data| storage.set(key, &data));
    if let Err(e) = result {
        warn!("could not save '{}': {}", key, e);
    }
}
