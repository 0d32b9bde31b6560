use std::collections::BTreeMap;

use albar_storage::StorageBackend;
use albar_types::{
    entities::{Client, User},
    error::{Error, Result},
};

/// Repository for Client entity operations
///
/// Key schema:
/// - `client:{id}` -> Client data
/// - `client:owner:{user_id}:{id}` -> client_id (owner listing)
/// - `client:company:{cif_lowercase}:{id}` -> client_id (company listing)
/// - `client:cif:{cif}:{id}` -> client_id (duplicate checking)
///
/// Listings union the owner and company indexes; cif uniqueness is scoped
/// per (creator OR creator's company), so the duplicate check walks the cif
/// index and tests the ownership predicate against each hit.
pub struct ClientRepository<S: StorageBackend> {
    storage: S,
}

impl<S: StorageBackend> ClientRepository<S> {
    /// Create a new client repository
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn client_key(id: i64) -> Vec<u8> {
        format!("client:{id}").into_bytes()
    }

    fn owner_index_key(owner: i64, id: i64) -> Vec<u8> {
        format!("client:owner:{owner}:{id}").into_bytes()
    }

    fn company_index_key(cif: &str, id: i64) -> Vec<u8> {
        format!("client:company:{}:{}", cif.to_lowercase(), id).into_bytes()
    }

    fn cif_index_key(cif: &str, id: i64) -> Vec<u8> {
        format!("client:cif:{cif}:{id}").into_bytes()
    }

    /// Ids under an index prefix, e.g. `client:owner:42:`
    async fn index_ids(&self, prefix: String) -> Result<Vec<i64>> {
        let start = prefix.clone().into_bytes();
        let mut end = prefix.into_bytes();
        end.pop(); // replace trailing ':' with '~' to cover the prefix
        end.push(b'~');

        let kvs = self
            .storage
            .get_range(start..end)
            .await
            .map_err(|e| Error::internal(format!("Failed to read client index: {e}")))?;

        kvs.iter().map(|kv| super::parse_i64_id(&kv.value)).collect()
    }

    /// Whether another client with this cif already belongs to the same
    /// creator or the same company
    async fn cif_conflicts(
        &self,
        cif: &str,
        created_by: i64,
        company_id: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        for id in self.index_ids(format!("client:cif:{cif}:")).await? {
            if Some(id) == exclude_id {
                continue;
            }
            let Some(other) = self.get(id).await? else { continue };
            if other.created_by == created_by {
                return Ok(true);
            }
            if let (Some(a), Some(b)) = (company_id, other.company_id.as_deref()) {
                if a == b {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Create a new client
    pub async fn create(&self, client: Client) -> Result<()> {
        if self
            .cif_conflicts(&client.cif, client.created_by, client.company_id.as_deref(), None)
            .await?
        {
            return Err(Error::already_exists(
                "Este cliente ya está registrado por ti o tu compañía",
            ));
        }

        let client_data = serde_json::to_vec(&client)
            .map_err(|e| Error::internal(format!("Failed to serialize client: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        let id_bytes = client.id.to_le_bytes().to_vec();
        txn.set(Self::client_key(client.id), client_data);
        txn.set(Self::owner_index_key(client.created_by, client.id), id_bytes.clone());
        txn.set(Self::cif_index_key(&client.cif, client.id), id_bytes.clone());
        if let Some(cif) = &client.company_id {
            txn.set(Self::company_index_key(cif, client.id), id_bytes);
        }

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit client creation: {e}")))?;

        Ok(())
    }

    /// Get a client by ID, including archived records
    pub async fn get(&self, id: i64) -> Result<Option<Client>> {
        let data = self
            .storage
            .get(&Self::client_key(id))
            .await
            .map_err(|e| Error::internal(format!("Failed to get client: {e}")))?;

        match data {
            Some(bytes) => {
                let client: Client = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::internal(format!("Failed to deserialize client: {e}")))?;
                Ok(Some(client))
            },
            None => Ok(None),
        }
    }

    /// Get a non-archived client by ID
    pub async fn find_active(&self, id: i64) -> Result<Option<Client>> {
        Ok(self.get(id).await?.filter(|c| !c.is_deleted()))
    }

    /// All clients visible to a user (own plus company), any state
    async fn list_for(&self, user: &User) -> Result<Vec<Client>> {
        let mut ids = self.index_ids(format!("client:owner:{}:", user.id)).await?;
        if let Some(cif) = user.company_cif() {
            ids.extend(
                self.index_ids(format!("client:company:{}:", cif.to_lowercase())).await?,
            );
        }

        // BTreeMap dedups ids shared by both indexes and keeps id order
        let mut clients = BTreeMap::new();
        for id in ids {
            if let Some(client) = self.get(id).await? {
                clients.insert(client.id, client);
            }
        }
        Ok(clients.into_values().collect())
    }

    /// Active clients visible to a user
    pub async fn list_active_for(&self, user: &User) -> Result<Vec<Client>> {
        Ok(self.list_for(user).await?.into_iter().filter(|c| !c.is_deleted()).collect())
    }

    /// Archived clients visible to a user
    pub async fn list_archived_for(&self, user: &User) -> Result<Vec<Client>> {
        Ok(self.list_for(user).await?.into_iter().filter(Client::is_deleted).collect())
    }

    /// Update a client
    ///
    /// Re-checks cif uniqueness and moves the cif index when it changed.
    /// Creator and company never change after creation.
    pub async fn update(&self, client: Client) -> Result<()> {
        let existing = self
            .get(client.id)
            .await?
            .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;

        if existing.cif != client.cif
            && self
                .cif_conflicts(
                    &client.cif,
                    client.created_by,
                    client.company_id.as_deref(),
                    Some(client.id),
                )
                .await?
        {
            return Err(Error::already_exists(
                "Este cliente ya está registrado por ti o tu compañía",
            ));
        }

        let client_data = serde_json::to_vec(&client)
            .map_err(|e| Error::internal(format!("Failed to serialize client: {e}")))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        if existing.cif != client.cif {
            txn.delete(Self::cif_index_key(&existing.cif, client.id));
            txn.set(Self::cif_index_key(&client.cif, client.id), client.id.to_le_bytes().to_vec());
        }
        txn.set(Self::client_key(client.id), client_data);

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit client update: {e}")))?;

        Ok(())
    }

    /// Archive a client (soft delete)
    pub async fn archive(&self, id: i64) -> Result<Client> {
        let mut client =
            self.get(id).await?.ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
        client.mark_deleted();
        self.update(client.clone()).await?;
        Ok(client)
    }

    /// Restore an archived client
    pub async fn restore(&self, id: i64) -> Result<Client> {
        let mut client =
            self.get(id).await?.ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
        client.restore();
        self.update(client.clone()).await?;
        Ok(client)
    }

    /// Permanently delete a client and all indexes (irreversible)
    pub async fn purge(&self, id: i64) -> Result<()> {
        let client =
            self.get(id).await?.ok_or_else(|| Error::not_found("Cliente no encontrado"))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.delete(Self::client_key(id));
        txn.delete(Self::owner_index_key(client.created_by, id));
        txn.delete(Self::cif_index_key(&client.cif, id));
        if let Some(cif) = &client.company_id {
            txn.delete(Self::company_index_key(cif, id));
        }

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit client deletion: {e}")))?;

        Ok(())
    }
}
