use bon::bon;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What a delivery note logs: worked hours or delivered materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoteKind {
    Hours,
    Materials,
}

/// One line item within a delivery note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
}

/// Delivery note entity
///
/// Once `signed` flips to true the note is immutable except for reads: no
/// further edits and no deletion, soft or hard, for any caller. The
/// transition is one-way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryNote {
    /// Unique note ID (Snowflake ID)
    pub id: i64,

    /// Creating user
    pub created_by: i64,

    pub client_id: i64,
    pub project_id: i64,

    pub kind: NoteKind,

    /// Ordered line items
    pub entries: Vec<NoteEntry>,

    pub signed: bool,

    /// IPFS gateway URL of the signature image, set when signed
    pub signature_url: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

#[bon]
impl DeliveryNote {
    /// Create a new unsigned delivery note
    ///
    /// Requires at least one entry; every entry needs a name and a positive
    /// quantity.
    #[builder(finish_fn = create)]
    pub fn new(
        id: i64,
        created_by: i64,
        client_id: i64,
        project_id: i64,
        kind: NoteKind,
        entries: Vec<NoteEntry>,
    ) -> Result<Self> {
        Self::validate_entries(&entries)?;
        Ok(Self {
            id,
            created_by,
            client_id,
            project_id,
            kind,
            entries,
            signed: false,
            signature_url: None,
            created_at: Utc::now(),
            deleted_at: None,
        })
    }

    /// Validate a note's line items
    pub fn validate_entries(entries: &[NoteEntry]) -> Result<()> {
        if entries.is_empty() {
            return Err(Error::validation("El albarán debe tener al menos una entrada"));
        }
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(Error::validation("Cada entrada debe tener un nombre"));
            }
            if !entry.quantity.is_finite() || entry.quantity <= 0.0 {
                return Err(Error::validation("La cantidad debe ser un número positivo"));
            }
        }
        Ok(())
    }

    /// Apply the signature
    ///
    /// One-way transition; fails if the note is already signed.
    pub fn sign(&mut self, signature_url: impl Into<String>) -> Result<()> {
        if self.signed {
            return Err(Error::validation("El albarán ya está firmado"));
        }
        self.signed = true;
        self.signature_url = Some(signature_url.into());
        Ok(())
    }

    /// Whether the note may be deleted at all (signed notes never can)
    pub fn can_be_deleted(&self) -> bool {
        !self.signed
    }

    /// Whether the record is archived
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Archive the record
    pub fn mark_deleted(&mut self) {
        self.deleted_at = Some(Utc::now());
    }

    /// Clear the archive marker
    pub fn restore(&mut self) {
        self.deleted_at = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn hours_entry() -> NoteEntry {
        NoteEntry {
            name: "Instalación eléctrica".to_string(),
            quantity: 8.0,
            unit: Some("h".to_string()),
            description: None,
        }
    }

    fn test_note() -> DeliveryNote {
        DeliveryNote::builder()
            .id(1)
            .created_by(100)
            .client_id(10)
            .project_id(20)
            .kind(NoteKind::Hours)
            .entries(vec![hours_entry()])
            .create()
            .unwrap()
    }

    #[test]
    fn test_create_note() {
        let note = test_note();
        assert!(!note.signed);
        assert_eq!(note.signature_url, None);
        assert!(note.can_be_deleted());
    }

    #[test]
    fn test_empty_entries_rejected() {
        let result = DeliveryNote::builder()
            .id(1)
            .created_by(100)
            .client_id(10)
            .project_id(20)
            .kind(NoteKind::Materials)
            .entries(vec![])
            .create();
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
    }

    #[test]
    fn test_nonpositive_quantity_rejected() {
        for quantity in [0.0, -1.0, f64::NAN] {
            let entry = NoteEntry { quantity, ..hours_entry() };
            assert!(DeliveryNote::validate_entries(&[entry]).is_err());
        }
    }

    #[test]
    fn test_sign_is_one_way() {
        let mut note = test_note();
        note.sign("https://gateway.test/ipfs/Qmabc").unwrap();
        assert!(note.signed);
        assert_eq!(note.signature_url.as_deref(), Some("https://gateway.test/ipfs/Qmabc"));
        assert!(!note.can_be_deleted());

        let again = note.sign("https://gateway.test/ipfs/Qmother");
        assert!(again.is_err());
        // First signature untouched
        assert_eq!(note.signature_url.as_deref(), Some("https://gateway.test/ipfs/Qmabc"));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let note = test_note();
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["kind"], "hours");
    }
}
