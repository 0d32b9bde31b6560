use std::collections::BTreeMap;

use albar_storage::StorageBackend;
use albar_types::{
    entities::{Project, User},
    error::{Error, Result},
};

/// Repository for Project entity operations
///
/// Key schema:
/// - `project:{id}` -> Project data
/// - `project:owner:{user_id}:{id}` -> project_id (owner listing)
/// - `project:company:{cif_lowercase}:{id}` -> project_id (company listing)
/// - `project:name:{owner}:{client_id}:{name_lowercase}` -> project_id
///
/// The name index enforces (name, client, owner) uniqueness and exists only
/// while the project is active: archiving removes it (freeing the triple),
/// restoring re-checks and re-adds it.
pub struct ProjectRepository<S: StorageBackend> {
    storage: S,
}

impl<S: StorageBackend> ProjectRepository<S> {
    /// Create a new project repository
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn project_key(id: i64) -> Vec<u8> {
        format!("project:{id}").into_bytes()
    }

    fn owner_index_key(owner: i64, id: i64) -> Vec<u8> {
        format!("project:owner:{owner}:{id}").into_bytes()
    }

    fn company_index_key(cif: &str, id: i64) -> Vec<u8> {
        format!("project:company:{}:{}", cif.to_lowercase(), id).into_bytes()
    }

    fn name_index_key(owner: i64, client_id: i64, name: &str) -> Vec<u8> {
        format!("project:name:{owner}:{client_id}:{}", name.to_lowercase()).into_bytes()
    }

    async fn index_ids(&self, prefix: String) -> Result<Vec<i64>> {
        let start = prefix.clone().into_bytes();
        let mut end = prefix.into_bytes();
        end.pop();
        end.push(b'~');

        let kvs = self
            .storage
            .get_range(start..end)
            .await
            .map_err(|e| Error::internal(format!("Failed to read project index: {e}")))?;

        kvs.iter().map(|kv| super::parse_i64_id(&kv.value)).collect()
    }

    /// The active project currently holding this (owner, client, name)
    /// triple, if any
    async fn name_index_holder(
        &self,
        owner: i64,
        client_id: i64,
        name: &str,
    ) -> Result<Option<i64>> {
        let data = self
            .storage
            .get(&Self::name_index_key(owner, client_id, name))
            .await
            .map_err(|e| Error::internal(format!("Failed to read project name index: {e}")))?;
        data.map(|bytes| super::parse_i64_id(&bytes)).transpose()
    }

    /// Create a new project
    pub async fn create(&self, project: Project) -> Result<()> {
        if self
            .name_index_holder(project.owner, project.client_id, &project.name)
            .await?
            .is_some()
        {
            return Err(Error::already_exists(
                "Ya existe un proyecto con ese nombre para ese cliente",
            ));
        }

        let project_data = serde_json::to_vec(&project)
            .map_err(|e| Error::internal(format!("Failed to serialize project: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        let id_bytes = project.id.to_le_bytes().to_vec();
        txn.set(Self::project_key(project.id), project_data);
        txn.set(Self::owner_index_key(project.owner, project.id), id_bytes.clone());
        txn.set(
            Self::name_index_key(project.owner, project.client_id, &project.name),
            id_bytes.clone(),
        );
        if let Some(cif) = &project.company_id {
            txn.set(Self::company_index_key(cif, project.id), id_bytes);
        }

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit project creation: {e}")))?;

        Ok(())
    }

    /// Get a project by ID, including archived records
    pub async fn get(&self, id: i64) -> Result<Option<Project>> {
        let data = self
            .storage
            .get(&Self::project_key(id))
            .await
            .map_err(|e| Error::internal(format!("Failed to get project: {e}")))?;

        match data {
            Some(bytes) => {
                let project: Project = serde_json::from_slice(&bytes).map_err(|e| {
                    Error::internal(format!("Failed to deserialize project: {e}"))
                })?;
                Ok(Some(project))
            },
            None => Ok(None),
        }
    }

    /// Get a non-archived project by ID
    pub async fn find_active(&self, id: i64) -> Result<Option<Project>> {
        Ok(self.get(id).await?.filter(|p| !p.is_deleted()))
    }

    async fn list_for(&self, user: &User) -> Result<Vec<Project>> {
        let mut ids = self.index_ids(format!("project:owner:{}:", user.id)).await?;
        if let Some(cif) = user.company_cif() {
            ids.extend(
                self.index_ids(format!("project:company:{}:", cif.to_lowercase())).await?,
            );
        }

        let mut projects = BTreeMap::new();
        for id in ids {
            if let Some(project) = self.get(id).await? {
                projects.insert(project.id, project);
            }
        }
        Ok(projects.into_values().collect())
    }

    /// Active projects visible to a user (own plus company)
    pub async fn list_active_for(&self, user: &User) -> Result<Vec<Project>> {
        Ok(self.list_for(user).await?.into_iter().filter(|p| !p.is_deleted()).collect())
    }

    /// Archived projects visible to a user
    pub async fn list_archived_for(&self, user: &User) -> Result<Vec<Project>> {
        Ok(self.list_for(user).await?.into_iter().filter(Project::is_deleted).collect())
    }

    /// Update a project
    ///
    /// Moves the name index when the name or client changed, keeping the
    /// uniqueness guarantee. Owner and company never change.
    pub async fn update(&self, project: Project) -> Result<()> {
        let existing = self
            .get(project.id)
            .await?
            .ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;

        let triple_changed = existing.name.to_lowercase() != project.name.to_lowercase()
            || existing.client_id != project.client_id;

        if triple_changed {
            let holder = self
                .name_index_holder(project.owner, project.client_id, &project.name)
                .await?;
            if holder.is_some_and(|id| id != project.id) {
                return Err(Error::already_exists(
                    "Ya existe un proyecto con ese nombre para ese cliente",
                ));
            }
        }

        let project_data = serde_json::to_vec(&project)
            .map_err(|e| Error::internal(format!("Failed to serialize project: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        if triple_changed && !existing.is_deleted() {
            txn.delete(Self::name_index_key(existing.owner, existing.client_id, &existing.name));
            txn.set(
                Self::name_index_key(project.owner, project.client_id, &project.name),
                project.id.to_le_bytes().to_vec(),
            );
        }
        txn.set(Self::project_key(project.id), project_data);

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit project update: {e}")))?;

        Ok(())
    }

    /// Archive a project (soft delete), freeing its name triple
    pub async fn archive(&self, id: i64) -> Result<Project> {
        let mut project =
            self.get(id).await?.ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;
        let was_active = !project.is_deleted();
        project.mark_deleted();

        let project_data = serde_json::to_vec(&project)
            .map_err(|e| Error::internal(format!("Failed to serialize project: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        if was_active {
            txn.delete(Self::name_index_key(project.owner, project.client_id, &project.name));
        }
        txn.set(Self::project_key(id), project_data);

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit project archive: {e}")))?;

        Ok(project)
    }

    /// Restore an archived project
    ///
    /// Fails with `AlreadyExists` when the name triple was taken while the
    /// project sat in the archive.
    pub async fn restore(&self, id: i64) -> Result<Project> {
        let mut project =
            self.get(id).await?.ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;

        if project.is_deleted() {
            let holder = self
                .name_index_holder(project.owner, project.client_id, &project.name)
                .await?;
            if holder.is_some_and(|other| other != id) {
                return Err(Error::already_exists(
                    "Ya existe un proyecto con ese nombre para ese cliente",
                ));
            }
        }
        project.restore();

        let project_data = serde_json::to_vec(&project)
            .map_err(|e| Error::internal(format!("Failed to serialize project: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.set(
            Self::name_index_key(project.owner, project.client_id, &project.name),
            id.to_le_bytes().to_vec(),
        );
        txn.set(Self::project_key(id), project_data);

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit project restore: {e}")))?;

        Ok(project)
    }

    /// Permanently delete a project and all indexes (irreversible)
    pub async fn purge(&self, id: i64) -> Result<()> {
        let project =
            self.get(id).await?.ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.delete(Self::project_key(id));
        txn.delete(Self::owner_index_key(project.owner, id));
        if !project.is_deleted() {
            txn.delete(Self::name_index_key(project.owner, project.client_id, &project.name));
        }
        if let Some(cif) = &project.company_id {
            txn.delete(Self::company_index_key(cif, id));
        }

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit project deletion: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use albar_storage::MemoryBackend;
    use albar_types::entities::CompanyData;

    use super::*;

    fn create_test_repo() -> ProjectRepository<MemoryBackend> {
        ProjectRepository::new(MemoryBackend::new())
    }

    fn test_user(id: i64, cif: Option<&str>) -> User {
        let mut user = User::builder()
            .id(id)
            .email(format!("user{id}@example.com"))
            .password_hash("hash")
            .verification_code("123456")
            .create()
            .unwrap();
        user.company = cif.map(|cif| CompanyData {
            name: "Acme SL".to_string(),
            cif: cif.to_string(),
            address: None,
        });
        user
    }

    fn test_project(id: i64, name: &str, client_id: i64, owner: i64) -> Project {
        Project::builder().id(id).name(name).client_id(client_id).owner(owner).create().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = create_test_repo();
        let project = test_project(1, "Obra", 10, 100);

        repo.create(project.clone()).await.unwrap();
        assert_eq!(repo.get(1).await.unwrap(), Some(project));
    }

    #[tokio::test]
    async fn test_duplicate_triple_rejected() {
        let repo = create_test_repo();
        repo.create(test_project(1, "Obra", 10, 100)).await.unwrap();

        // Same triple, case-insensitive name
        let result = repo.create(test_project(2, "OBRA", 10, 100)).await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyExists { .. }));

        // Different client or owner is fine
        repo.create(test_project(3, "Obra", 11, 100)).await.unwrap();
        repo.create(test_project(4, "Obra", 10, 200)).await.unwrap();
    }

    #[tokio::test]
    async fn test_archive_frees_name_triple() {
        let repo = create_test_repo();
        repo.create(test_project(1, "Obra", 10, 100)).await.unwrap();
        repo.archive(1).await.unwrap();

        // Triple is free while project 1 is archived
        repo.create(test_project(2, "Obra", 10, 100)).await.unwrap();

        // Restoring project 1 now conflicts
        let result = repo.restore(1).await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_archive_restore_roundtrip() {
        let repo = create_test_repo();
        let owner = test_user(100, None);
        let project = test_project(1, "Obra", 10, 100);
        repo.create(project.clone()).await.unwrap();

        repo.archive(1).await.unwrap();
        assert!(repo.list_active_for(&owner).await.unwrap().is_empty());
        assert_eq!(repo.list_archived_for(&owner).await.unwrap().len(), 1);

        let restored = repo.restore(1).await.unwrap();
        assert_eq!(restored, project);

        // Uniqueness holds again after restore
        let result = repo.create(test_project(2, "Obra", 10, 100)).await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_listing_unions_owner_and_company() {
        let repo = create_test_repo();
        let alice = test_user(100, Some("B99999999"));

        repo.create(test_project(1, "Propia", 10, 100)).await.unwrap();
        let mut teammate_project = test_project(2, "De compañero", 10, 200);
        teammate_project.company_id = Some("B99999999".to_string());
        repo.create(teammate_project).await.unwrap();
        repo.create(test_project(3, "Ajena", 10, 300)).await.unwrap();

        let ids: Vec<i64> =
            repo.list_active_for(&alice).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_rename_moves_name_index() {
        let repo = create_test_repo();
        let mut project = test_project(1, "Obra", 10, 100);
        repo.create(project.clone()).await.unwrap();

        project.name = "Obra nueva".to_string();
        repo.update(project).await.unwrap();

        // Old name is free, new name is taken
        repo.create(test_project(2, "Obra", 10, 100)).await.unwrap();
        let result = repo.create(test_project(3, "Obra nueva", 10, 100)).await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_rename_onto_taken_name_rejected() {
        let repo = create_test_repo();
        repo.create(test_project(1, "Obra A", 10, 100)).await.unwrap();
        let mut second = test_project(2, "Obra B", 10, 100);
        repo.create(second.clone()).await.unwrap();

        second.name = "Obra A".to_string();
        let result = repo.update(second).await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_purge_frees_name_triple() {
        let repo = create_test_repo();
        repo.create(test_project(1, "Obra", 10, 100)).await.unwrap();
        repo.purge(1).await.unwrap();

        assert!(repo.get(1).await.unwrap().is_none());
        repo.create(test_project(2, "Obra", 10, 100)).await.unwrap();
    }
}
