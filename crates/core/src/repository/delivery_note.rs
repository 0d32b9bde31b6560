use std::collections::BTreeMap;

use albar_storage::StorageBackend;
use albar_types::{
    entities::DeliveryNote,
    error::{Error, Result},
};

/// Repository for DeliveryNote entity operations
///
/// Key schema:
/// - `note:{id}` -> DeliveryNote data
/// - `note:user:{creator_id}:{id}` -> note_id (creator listing)
///
/// Notes are listed per creator; company-wide visibility comes from the
/// caller passing every teammate's ID, since note sharing follows explicit
/// teammate lists rather than company cif matching.
pub struct DeliveryNoteRepository<S: StorageBackend> {
    storage: S,
}

impl<S: StorageBackend> DeliveryNoteRepository<S> {
    /// Create a new delivery note repository
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn note_key(id: i64) -> Vec<u8> {
        format!("note:{id}").into_bytes()
    }

    fn creator_index_key(creator: i64, id: i64) -> Vec<u8> {
        format!("note:user:{creator}:{id}").into_bytes()
    }

    /// Create a new delivery note
    pub async fn create(&self, note: DeliveryNote) -> Result<()> {
        let note_data = serde_json::to_vec(&note)
            .map_err(|e| Error::internal(format!("Failed to serialize delivery note: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.set(Self::note_key(note.id), note_data);
        txn.set(
            Self::creator_index_key(note.created_by, note.id),
            note.id.to_le_bytes().to_vec(),
        );

        txn.commit().await.map_err(|e| {
            Error::internal(format!("Failed to commit delivery note creation: {e}"))
        })?;

        Ok(())
    }

    /// Get a note by ID, including archived records
    pub async fn get(&self, id: i64) -> Result<Option<DeliveryNote>> {
        let data = self
            .storage
            .get(&Self::note_key(id))
            .await
            .map_err(|e| Error::internal(format!("Failed to get delivery note: {e}")))?;

        match data {
            Some(bytes) => {
                let note: DeliveryNote = serde_json::from_slice(&bytes).map_err(|e| {
                    Error::internal(format!("Failed to deserialize delivery note: {e}"))
                })?;
                Ok(Some(note))
            },
            None => Ok(None),
        }
    }

    /// Get a non-archived note by ID
    pub async fn find_active(&self, id: i64) -> Result<Option<DeliveryNote>> {
        Ok(self.get(id).await?.filter(|n| !n.is_deleted()))
    }

    /// Active notes created by any of the given users, in ID order
    pub async fn list_active_for(&self, creator_ids: &[i64]) -> Result<Vec<DeliveryNote>> {
        let mut notes = BTreeMap::new();
        for creator in creator_ids {
            let prefix = format!("note:user:{creator}:");
            let start = prefix.clone().into_bytes();
            let end = format!("note:user:{creator}~").into_bytes();

            let kvs = self
                .storage
                .get_range(start..end)
                .await
                .map_err(|e| Error::internal(format!("Failed to read note index: {e}")))?;

            for kv in kvs {
                let id = super::parse_i64_id(&kv.value)?;
                if let Some(note) = self.get(id).await? {
                    if !note.is_deleted() {
                        notes.insert(note.id, note);
                    }
                }
            }
        }
        Ok(notes.into_values().collect())
    }

    /// Update a note record
    pub async fn update(&self, note: DeliveryNote) -> Result<()> {
        if self.get(note.id).await?.is_none() {
            return Err(Error::not_found("Albarán no encontrado"));
        }

        let note_data = serde_json::to_vec(&note)
            .map_err(|e| Error::internal(format!("Failed to serialize delivery note: {e}")))?;

        self.storage
            .set(Self::note_key(note.id), note_data)
            .await
            .map_err(|e| Error::internal(format!("Failed to update delivery note: {e}")))?;

        Ok(())
    }

    /// Archive a note (soft delete)
    ///
    /// The caller is responsible for refusing signed notes; this is a plain
    /// lifecycle transition.
    pub async fn archive(&self, id: i64) -> Result<DeliveryNote> {
        let mut note =
            self.get(id).await?.ok_or_else(|| Error::not_found("Albarán no encontrado"))?;
        note.mark_deleted();
        self.update(note.clone()).await?;
        Ok(note)
    }

    /// Permanently delete a note and its index (irreversible)
    pub async fn purge(&self, id: i64) -> Result<()> {
        let note =
            self.get(id).await?.ok_or_else(|| Error::not_found("Albarán no encontrado"))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.delete(Self::note_key(id));
        txn.delete(Self::creator_index_key(note.created_by, id));

        txn.commit().await.map_err(|e| {
            Error::internal(format!("Failed to commit delivery note deletion: {e}"))
        })?;

        Ok(())
    }
}
