use bon::bon;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Project entity
///
/// References a client and an owning user; the (name, client, owner) triple
/// is unique while the project is not archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID (Snowflake ID)
    pub id: i64,

    pub name: String,
    pub description: Option<String>,

    /// Client this project belongs to
    pub client_id: i64,

    /// Owning user
    pub owner: i64,

    /// Owner's company cif at creation time, for company-wide visibility
    pub company_id: Option<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

#[bon]
impl Project {
    /// Create a new project
    ///
    /// Validates the name and that the end date does not precede the start
    /// date when both are given.
    #[builder(on(String, into), finish_fn = create)]
    pub fn new(
        id: i64,
        name: String,
        description: Option<String>,
        client_id: i64,
        owner: i64,
        company_id: Option<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self> {
        Self::validate_name(&name)?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(Error::validation(
                    "La fecha de fin no puede ser anterior a la de inicio",
                ));
            }
        }
        Ok(Self {
            id,
            name,
            description,
            client_id,
            owner,
            company_id,
            start_date,
            end_date,
            created_at: Utc::now(),
            deleted_at: None,
        })
    }

    /// Validate a project name
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation("El nombre del proyecto es obligatorio"));
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

    #[test]
    fn test_create_project() {
        let project = Project::builder()
            .id(1)
            .name("Obra nueva")
            .client_id(10)
            .owner(100)
            .create()
            .unwrap();
        assert_eq!(project.name, "Obra nueva");
        assert!(!project.is_deleted());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let result = Project::builder()
            .id(1)
            .name("Obra")
            .client_id(10)
            .owner(100)
            .start_date(start)
            .end_date(end)
            .create();
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
    }

    #[test]
    fn test_archive_restore_roundtrip() {
        let mut project =
            Project::builder().id(1).name("Obra").client_id(10).owner(100).create().unwrap();
        let before = project.clone();
        project.mark_deleted();
        project.restore();
        assert_eq!(project, before);
    }
}
