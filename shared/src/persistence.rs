use thiserror::Error;

use crate::capabilities::KvError;
use crate::model::BalanceRecord;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PersistenceError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("corrupted record under '{key}': {reason}")]
    Corrupted { key: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] KvError),

    #[error("storage request failed: {0}")]
    Request(String),
}

/// Serializes the whole record; it replaces whatever was stored.
pub fn encode(record: &BalanceRecord) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec(record).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

/// Parses a stored record. Unparsable bytes and records holding negative
/// or non-finite balances are both reported as [`PersistenceError::Corrupted`].
pub fn decode(key: &str, raw: &[u8]) -> Result<BalanceRecord, PersistenceError> {
    let record: BalanceRecord = serde_json::from_slice(raw).map_err(|e| PersistenceError::Corrupted {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    if !record.is_valid() {
        return Err(PersistenceError::Corrupted {
            key: key.to_string(),
            reason: format!("invalid secondary balance {}", record.secondary_balance),
        });
    }

    Ok(record)
}
