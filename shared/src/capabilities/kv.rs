use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crux_kv::error::KeyValueError;
use crux_kv::value::Value;
use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Synchronous string key-value medium (browser local/session storage,
/// SQLite on native shells, a map in tests).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
    fn remove(&self, key: &str) -> Result<(), KvError>;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message} (code: {code:?})")]
    Storage {
        code: StorageErrorCode,
        message: String,
    },
}

impl KvError {
    pub fn storage(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageErrorCode {
    Unknown,
    Unavailable,
    QuotaExceeded,
    Busy,
    Locked,
    Poisoned,
    IoError,
}

pub fn validate_key(key: &str) -> Result<(), KvError> {
    if key.trim().is_empty() {
        return Err(KvError::InvalidKey {
            key: key.to_string(),
            reason: "key cannot be empty".to_string(),
        });
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(KvError::InvalidKey {
            key: key.chars().take(50).collect::<String>() + "...",
            reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
        });
    }

    if key.contains('\0') {
        return Err(KvError::InvalidKey {
            key: key.replace('\0', "\\0"),
            reason: "key cannot contain null bytes".to_string(),
        });
    }

    if key.chars().any(|c| c.is_control() && c != '\t') {
        return Err(KvError::InvalidKey {
            key: key.to_string(),
            reason: "key contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

fn validate_value(value: &str) -> Result<(), KvError> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

impl From<KvError> for KeyValueError {
    fn from(error: KvError) -> Self {
        match error {
            KvError::Storage { .. } => KeyValueError::Io {
                message: error.to_string(),
            },
            other => KeyValueError::Other {
                message: other.to_string(),
            },
        }
    }
}

fn to_value(text: Option<String>) -> Value {
    text.map_or(Value::None, |text| Value::Bytes(text.into_bytes()))
}

/// Answers a `crux_kv` request against a string store. Values cross the
/// boundary as UTF-8; anything else is rejected before it reaches the store.
pub fn resolve_key_value(store: &dyn KeyValueStore, operation: &KeyValueOperation) -> KeyValueResult {
    let outcome: Result<KeyValueResponse, KeyValueError> = match operation {
        KeyValueOperation::Get { key } => store
            .get(key)
            .map(|value| KeyValueResponse::Get {
                value: to_value(value),
            })
            .map_err(Into::into),
        KeyValueOperation::Set { key, value } => match std::str::from_utf8(value) {
            Ok(text) => store.get(key).and_then(|previous| {
                store.set(key, text)?;
                Ok(KeyValueResponse::Set {
                    previous: to_value(previous),
                })
            })
            .map_err(Into::into),
            Err(e) => Err(KeyValueError::Other {
                message: format!("value for '{key}' is not UTF-8: {e}"),
            }),
        },
        KeyValueOperation::Delete { key } => store
            .get(key)
            .and_then(|previous| {
                store.remove(key)?;
                Ok(KeyValueResponse::Delete {
                    previous: to_value(previous),
                })
            })
            .map_err(Into::into),
        KeyValueOperation::Exists { key } => store
            .get(key)
            .map(|value| KeyValueResponse::Exists {
                is_present: value.is_some(),
            })
            .map_err(Into::into),
        other => Err(KeyValueError::Other {
            message: format!("unsupported key-value operation: {other:?}"),
        }),
    };

    match outcome {
        Ok(response) => KeyValueResult::Ok { response },
        Err(error) => {
            tracing::warn!(?error, "key-value request failed");
            KeyValueResult::Err { error }
        }
    }
}

/// In-process store. Used for the per-session flags and by shells that
/// have no durable medium.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set`/`remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| KvError::storage(StorageErrorCode::Poisoned, "memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        validate_key(key)?;
        validate_value(value)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| KvError::storage(StorageErrorCode::Poisoned, "memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| KvError::storage(StorageErrorCode::Poisoned, "memory store lock poisoned"))?;
        entries.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// SQLite-backed durable store.
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub struct SqliteStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
impl SqliteStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, KvError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| KvError::storage(StorageErrorCode::Unavailable, e.to_string()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, KvError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| KvError::storage(StorageErrorCode::Unavailable, e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: rusqlite::Connection) -> Result<Self, KvError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(sqlite_error)?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, KvError> {
        self.conn
            .lock()
            .map_err(|_| KvError::storage(StorageErrorCode::Poisoned, "sqlite connection lock poisoned"))
    }
}

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
fn sqlite_error(e: rusqlite::Error) -> KvError {
    let code = match &e {
        rusqlite::Error::SqliteFailure(err, _) => match err.code {
            rusqlite::ErrorCode::DatabaseBusy => StorageErrorCode::Busy,
            rusqlite::ErrorCode::DatabaseLocked => StorageErrorCode::Locked,
            rusqlite::ErrorCode::DiskFull => StorageErrorCode::QuotaExceeded,
            rusqlite::ErrorCode::SystemIoFailure => StorageErrorCode::IoError,
            _ => StorageErrorCode::Unknown,
        },
        _ => StorageErrorCode::Unknown,
    };
    KvError::storage(code, e.to_string())
}

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        use rusqlite::OptionalExtension;

        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(sqlite_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        validate_key(key)?;
        validate_value(value)?;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            rusqlite::params![key, value],
        )
        .map_err(sqlite_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])
            .map_err(sqlite_error)?;
        Ok(())
    }
}
