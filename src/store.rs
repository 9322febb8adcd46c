use std::collections::BTreeMap;
use thiserror::Error;

use crate::horse::HorseRecord;
use crate::models::HorseId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already persisted as {0}")]
    AlreadyPersisted(HorseId),
    #[error("record has not been persisted yet")]
    NotPersisted,
    #[error("no stored record with id {0}")]
    Missing(HorseId),
    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable storage of horse records, keyed by integer id.
///
/// Writes are synchronous and never retried by callers; a failed write is
/// reported and the in-memory record keeps the attempted change.
pub trait RecordStore {
    fn load_all(&mut self) -> Result<Vec<HorseRecord>, StoreError>;

    /// Persists a record that has no id yet and writes the assigned id into it.
    fn insert(&mut self, record: &mut HorseRecord) -> Result<HorseId, StoreError>;

    fn update(&mut self, record: &HorseRecord) -> Result<(), StoreError>;

    fn delete(&mut self, id: HorseId) -> Result<(), StoreError>;
}

/// Writes `record` and logs a failure. The caller decides whether to report it.
pub fn update_logged<S: RecordStore + ?Sized>(store: &mut S, record: &HorseRecord, context: &str) -> Result<(), StoreError> {
    store.update(record).map_err(|e| {
        log::error!("🐴 Failed to save horse {} after {}: {}", record.label(), context, e);
        e
    })
}

/// Record store keeping each row as its serialized JSON blob.
///
/// Rows go through the same encode/decode path a database-backed store would,
/// so anything that does not survive serialization shows up here too.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: BTreeMap<HorseId, String>,
    next_id: u64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        MemoryRecordStore { rows: BTreeMap::new(), next_id: 1 }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: HorseId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Decodes one stored row.
    pub fn get(&self, id: HorseId) -> Result<HorseRecord, StoreError> {
        let blob = self.rows.get(&id).ok_or(StoreError::Missing(id))?;
        Ok(serde_json::from_str(blob)?)
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_all(&mut self) -> Result<Vec<HorseRecord>, StoreError> {
        self.rows
            .values()
            .map(|blob| serde_json::from_str(blob).map_err(StoreError::from))
            .collect()
    }

    fn insert(&mut self, record: &mut HorseRecord) -> Result<HorseId, StoreError> {
        if let Some(id) = record.id {
            return Err(StoreError::AlreadyPersisted(id));
        }
        let id = HorseId(self.next_id.max(1));
        record.id = Some(id);
        match serde_json::to_string(record) {
            Ok(blob) => {
                self.rows.insert(id, blob);
                self.next_id = id.0 + 1;
                Ok(id)
            }
            Err(e) => {
                record.id = None;
                Err(e.into())
            }
        }
    }

    fn update(&mut self, record: &HorseRecord) -> Result<(), StoreError> {
        let id = record.id.ok_or(StoreError::NotPersisted)?;
        if !self.rows.contains_key(&id) {
            return Err(StoreError::Missing(id));
        }
        let blob = serde_json::to_string(record)?;
        self.rows.insert(id, blob);
        Ok(())
    }

    fn delete(&mut self, id: HorseId) -> Result<(), StoreError> {
        self.rows.remove(&id).map(|_| ()).ok_or(StoreError::Missing(id))
    }
}
