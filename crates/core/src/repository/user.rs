use albar_storage::StorageBackend;
use albar_types::{
    entities::User,
    error::{Error, Result},
};
use bytes::Bytes;

/// Bounded retries for compare-and-swap counter updates
const CAS_RETRY_LIMIT: usize = 8;

/// Repository for User entity operations
///
/// Key schema:
/// - `user:{id}` -> User data
/// - `user:email:{email_lowercase}` -> user_id (unique across archived accounts)
/// - `user:reset:{token}` -> user_id (active password-recovery tokens)
///
/// `get` deliberately resolves archived users so a disabled or archived
/// account can still authenticate far enough to be inspected and restored;
/// the login path goes through `find_active_by_email` instead.
pub struct UserRepository<S: StorageBackend> {
    storage: S,
}

impl<S: StorageBackend> UserRepository<S> {
    /// Create a new user repository
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Generate key for user by ID
    fn user_key(id: i64) -> Vec<u8> {
        format!("user:{id}").into_bytes()
    }

    /// Generate key for the unique email index
    fn email_index_key(email: &str) -> Vec<u8> {
        format!("user:email:{}", email.to_lowercase()).into_bytes()
    }

    /// Generate key for the reset-token index
    fn reset_index_key(token: &str) -> Vec<u8> {
        format!("user:reset:{token}").into_bytes()
    }

    fn serialize(user: &User) -> Result<Vec<u8>> {
        serde_json::to_vec(user)
            .map_err(|e| Error::internal(format!("Failed to serialize user: {e}")))
    }

    fn deserialize(bytes: &[u8]) -> Result<User> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::internal(format!("Failed to deserialize user: {e}")))
    }

    /// Create a new user
    ///
    /// Fails with `AlreadyExists` when the email is taken, including by an
    /// archived account.
    pub async fn create(&self, user: User) -> Result<()> {
        let email_key = Self::email_index_key(&user.email);
        if self
            .storage
            .get(&email_key)
            .await
            .map_err(|e| Error::internal(format!("Failed to check duplicate email: {e}")))?
            .is_some()
        {
            return Err(Error::already_exists("Email ya registrado"));
        }

        let user_data = Self::serialize(&user)?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.set(Self::user_key(user.id), user_data);
        txn.set(email_key, user.id.to_le_bytes().to_vec());

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit user creation: {e}")))?;

        Ok(())
    }

    /// Get a user by ID, including archived accounts
    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        Ok(self.get_with_raw(id).await?.map(|(user, _)| user))
    }

    /// Get a user together with the exact stored bytes, for guarded updates
    async fn get_with_raw(&self, id: i64) -> Result<Option<(User, Bytes)>> {
        let data = self
            .storage
            .get(&Self::user_key(id))
            .await
            .map_err(|e| Error::internal(format!("Failed to get user: {e}")))?;

        match data {
            Some(bytes) => {
                let user = Self::deserialize(&bytes)?;
                Ok(Some((user, bytes)))
            },
            None => Ok(None),
        }
    }

    /// Get a non-archived user by ID
    pub async fn find_active(&self, id: i64) -> Result<Option<User>> {
        Ok(self.get(id).await?.filter(|u| !u.is_deleted()))
    }

    /// Resolve a user by email, including archived accounts
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let data = self
            .storage
            .get(&Self::email_index_key(email))
            .await
            .map_err(|e| Error::internal(format!("Failed to read email index: {e}")))?;

        match data {
            Some(bytes) => self.get(super::parse_i64_id(&bytes)?).await,
            None => Ok(None),
        }
    }

    /// Resolve a non-archived user by email (the login path)
    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.get_by_email(email).await?.filter(|u| !u.is_deleted()))
    }

    /// Resolve a user by an unexpired reset token
    ///
    /// Returns `None` when the token is unknown, expired, or no longer
    /// matches the record (already consumed and replaced).
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        let data = self
            .storage
            .get(&Self::reset_index_key(token))
            .await
            .map_err(|e| Error::internal(format!("Failed to read reset-token index: {e}")))?;

        let Some(bytes) = data else { return Ok(None) };
        let Some(user) = self.get(super::parse_i64_id(&bytes)?).await? else { return Ok(None) };

        let valid = user.reset_token.as_deref() == Some(token)
            && user.reset_token_expires.is_some_and(|exp| exp > chrono::Utc::now());
        Ok(valid.then_some(user))
    }

    /// Update a user record
    ///
    /// Maintains the reset-token index when the token changed. The email is
    /// immutable, so the email index is never touched here.
    pub async fn update(&self, user: User) -> Result<()> {
        let existing = self
            .get(user.id)
            .await?
            .ok_or_else(|| Error::not_found("Usuario no encontrado"))?;

        let user_data = Self::serialize(&user)?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        if existing.reset_token != user.reset_token {
            if let Some(old) = &existing.reset_token {
                txn.delete(Self::reset_index_key(old));
            }
            if let Some(new) = &user.reset_token {
                txn.set(Self::reset_index_key(new), user.id.to_le_bytes().to_vec());
            }
        }

        txn.set(Self::user_key(user.id), user_data);

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit user update: {e}")))?;

        Ok(())
    }

    /// Record a failed login attempt atomically
    ///
    /// Re-reads and compare-and-swaps the record so concurrent failures
    /// cannot race past the decrement-to-zero disable threshold. Returns
    /// the updated user, or `None` if the account vanished meanwhile.
    pub async fn record_failed_login(&self, id: i64) -> Result<Option<User>> {
        self.mutate_guarded(id, |user| {
            user.note_failed_login();
        })
        .await
    }

    /// Reset the login counter after a successful login, atomically
    pub async fn record_successful_login(&self, id: i64) -> Result<Option<User>> {
        self.mutate_guarded(id, |user| {
            user.reset_login_attempts();
        })
        .await
    }

    /// Record a failed email-verification attempt atomically
    pub async fn record_failed_verification(&self, id: i64) -> Result<Option<User>> {
        self.mutate_guarded(id, |user| {
            user.note_failed_verification();
        })
        .await
    }

    /// Bounded compare-and-swap loop over a single user record
    ///
    /// The mutation must not touch indexed fields (email, reset token).
    async fn mutate_guarded(
        &self,
        id: i64,
        mutate: impl Fn(&mut User) + Send,
    ) -> Result<Option<User>> {
        let key = Self::user_key(id);
        for _ in 0..CAS_RETRY_LIMIT {
            let Some((mut user, raw)) = self.get_with_raw(id).await? else {
                return Ok(None);
            };
            mutate(&mut user);
            let new_data = Self::serialize(&user)?;

            match self.storage.compare_and_set(&key, Some(raw.as_ref()), new_data).await {
                Ok(()) => return Ok(Some(user)),
                Err(e) if e.is_cas_conflict() => continue,
                Err(e) => {
                    return Err(Error::internal(format!("Failed to update user counters: {e}")));
                },
            }
        }
        Err(Error::internal("User counter update kept conflicting"))
    }

    /// Archive a user (soft delete)
    pub async fn archive(&self, id: i64) -> Result<User> {
        let mut user =
            self.get(id).await?.ok_or_else(|| Error::not_found("Usuario no encontrado"))?;
        user.mark_deleted();
        self.update(user.clone()).await?;
        Ok(user)
    }

    /// Restore an archived user
    ///
    /// Clears the marker, resets the login counter and re-verifies the
    /// account.
    pub async fn restore(&self, id: i64) -> Result<User> {
        let mut user =
            self.get(id).await?.ok_or_else(|| Error::not_found("Usuario no encontrado"))?;
        user.restore();
        self.update(user.clone()).await?;
        Ok(user)
    }

    /// Permanently delete a user and all indexes (irreversible)
    pub async fn purge(&self, id: i64) -> Result<()> {
        let user =
            self.get(id).await?.ok_or_else(|| Error::not_found("Usuario no encontrado"))?;

        let mut txn = self
            .storage
            .transaction()
            .await
            .map_err(|e| Error::internal(format!("Failed to start transaction: {e}")))?;

        txn.delete(Self::user_key(id));
        txn.delete(Self::email_index_key(&user.email));
        if let Some(token) = &user.reset_token {
            txn.delete(Self::reset_index_key(token));
        }

        txn.commit()
            .await
            .map_err(|e| Error::internal(format!("Failed to commit user deletion: {e}")))?;

        Ok(())
    }
}
