use std::sync::LazyLock;

use bon::bon;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::{Error, Result};

/// Client tax-id shape: one uppercase letter followed by 8 digits
/// (e.g. `B12345678`)
static CIF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{8}$").expect("valid cif regex"));

/// Client record entity
///
/// Owned by its creator and visible to any user sharing the creator's
/// company cif. The cif is unique per (creator OR creator's company); the
/// same cif may exist for unrelated users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique client ID (Snowflake ID)
    pub id: i64,

    pub name: String,

    /// Tax identifier, shape `^[A-Z]\d{8}$`
    pub cif: String,

    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,

    /// Owning user
    pub created_by: i64,

    /// Creator's company cif at creation time, for company-wide visibility
    pub company_id: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

#[bon]
impl Client {
    /// Create a new client record
    ///
    /// Validates the name, cif shape, and contact email shape.
    #[builder(on(String, into), finish_fn = create)]
    pub fn new(
        id: i64,
        name: String,
        cif: String,
        address: Option<String>,
        contact_email: Option<String>,
        contact_phone: Option<String>,
        created_by: i64,
        company_id: Option<String>,
    ) -> Result<Self> {
        Self::validate_name(&name)?;
        Self::validate_cif(&cif)?;
        if let Some(email) = &contact_email {
            User::validate_email(email)?;
        }
        Ok(Self {
            id,
            name,
            cif,
            address,
            contact_email,
            contact_phone,
            created_by,
            company_id,
            created_at: Utc::now(),
            deleted_at: None,
        })
    }

    /// Validate a client name
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation("El nombre del cliente es obligatorio"));
        }
        Ok(())
    }

    /// Validate a client cif shape
    pub fn validate_cif(cif: &str) -> Result<()> {
        if !CIF_RE.is_match(cif) {
            return Err(Error::validation("CIF no válido (formato esperado: B12345678)"));
        }
        Ok(())
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

    fn test_client() -> Client {
        Client::builder()
            .id(1)
            .name("Cliente X")
            .cif("B12345678")
            .created_by(100)
            .create()
            .unwrap()
    }

    #[test]
    fn test_create_client() {
        let client = test_client();
        assert_eq!(client.name, "Cliente X");
        assert_eq!(client.cif, "B12345678");
        assert!(!client.is_deleted());
        assert_eq!(client.company_id, None);
    }

    #[test]
    fn test_cif_shape_rejected() {
        for cif in ["b12345678", "B1234567", "B123456789", "12345678B", "BB2345678"] {
            assert!(Client::validate_cif(cif).is_err(), "{cif} should be rejected");
        }
        assert!(Client::validate_cif("A00000001").is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result =
            Client::builder().id(1).name("  ").cif("B12345678").created_by(100).create();
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_contact_email_rejected() {
        let result = Client::builder()
            .id(1)
            .name("Cliente X")
            .cif("B12345678")
            .contact_email("not-an-email")
            .created_by(100)
            .create();
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
    }

    #[test]
    fn test_archive_restore_roundtrip() {
        let mut client = test_client();
        let before = client.clone();

        client.mark_deleted();
        assert!(client.is_deleted());

        client.restore();
        assert_eq!(client, before);
    }
}
