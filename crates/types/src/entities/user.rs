use std::sync::LazyLock;

use albar_const::limits::{MAX_LOGIN_ATTEMPTS, MAX_VERIFICATION_ATTEMPTS};
use bon::bon;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Email shape check: something@something.tld, no whitespace
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Account lifecycle status
///
/// Exactly one status holds at any time. `Disabled` is terminal for login
/// and verification until an explicit restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Verified,
    Disabled,
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    Guest,
}

/// Personal onboarding data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalData {
    pub name: String,
    pub surname: String,
    pub nif: String,
}

/// Company profile data
///
/// The `cif` doubles as the company identifier used for resource scoping:
/// users reporting the same cif see each other's clients and projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyData {
    pub name: String,
    pub cif: String,
    pub address: Option<String>,
}

/// User account entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID (Snowflake ID)
    pub id: i64,

    /// Login email, unique across all accounts including archived ones
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    pub status: UserStatus,
    pub role: UserRole,

    /// Current email verification code (6 decimal digits)
    pub verification_code: String,

    /// Remaining verification attempts before the account is disabled
    pub verification_attempts: i32,

    /// Remaining login attempts before the account is disabled
    pub login_attempts: i32,

    /// Active password-recovery token (64 hex chars), if any
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,

    /// Self-employed flag; company data derives from personal data when set
    pub autonomo: bool,

    pub personal: Option<PersonalData>,
    pub company: Option<CompanyData>,

    /// IPFS gateway URL of the uploaded company logo
    pub logo_url: Option<String>,

    /// Explicit teammate list: user IDs whose delivery notes this user may
    /// see, and vice versa. Maintained symmetrically by the invite flow.
    pub company_users: Vec<i64>,

    pub created_at: DateTime<Utc>,

    /// Soft-delete marker; set while the account is archived
    pub deleted_at: Option<DateTime<Utc>>,
}

#[bon]
impl User {
    /// Create a new pending user
    ///
    /// Validates the email shape. The password must already be hashed;
    /// plaintext never reaches the entity layer.
    #[builder(on(String, into), finish_fn = create)]
    pub fn new(
        id: i64,
        email: String,
        password_hash: String,
        verification_code: String,
        role: Option<UserRole>,
        company: Option<CompanyData>,
        company_users: Option<Vec<i64>>,
    ) -> Result<Self> {
        Self::validate_email(&email)?;
        Ok(Self {
            id,
            email,
            password_hash,
            status: UserStatus::Pending,
            role: role.unwrap_or_default(),
            verification_code,
            verification_attempts: MAX_VERIFICATION_ATTEMPTS,
            login_attempts: MAX_LOGIN_ATTEMPTS,
            reset_token: None,
            reset_token_expires: None,
            autonomo: false,
            personal: None,
            company,
            logo_url: None,
            company_users: company_users.unwrap_or_default(),
            created_at: Utc::now(),
            deleted_at: None,
        })
    }

    /// Validate an email address shape
    pub fn validate_email(email: &str) -> Result<()> {
        if !EMAIL_RE.is_match(email) {
            return Err(Error::validation("Email no válido"));
        }
        Ok(())
    }

    /// The company cif used for resource scoping, if the profile has one
    pub fn company_cif(&self) -> Option<&str> {
        self.company.as_ref().map(|c| c.cif.as_str())
    }

    /// Display name for documents: personal name, or the email as fallback
    pub fn display_name(&self) -> String {
        match &self.personal {
            Some(p) => format!("{} {}", p.name, p.surname),
            None => self.email.clone(),
        }
    }

    /// Record a failed login attempt
    ///
    /// Decrements the counter, clamped at zero; reaching zero disables the
    /// account. Returns the remaining attempts.
    pub fn note_failed_login(&mut self) -> i32 {
        self.login_attempts = (self.login_attempts - 1).max(0);
        if self.login_attempts == 0 {
            self.status = UserStatus::Disabled;
        }
        self.login_attempts
    }

    /// Reset the login attempt counter after a successful login
    pub fn reset_login_attempts(&mut self) {
        self.login_attempts = MAX_LOGIN_ATTEMPTS;
    }

    /// Record a failed email verification attempt
    ///
    /// Same clamp-and-disable contract as [`note_failed_login`].
    ///
    /// [`note_failed_login`]: Self::note_failed_login
    pub fn note_failed_verification(&mut self) -> i32 {
        self.verification_attempts = (self.verification_attempts - 1).max(0);
        if self.verification_attempts == 0 {
            self.status = UserStatus::Disabled;
        }
        self.verification_attempts
    }

    /// Mark the email as verified
    pub fn mark_verified(&mut self) {
        self.status = UserStatus::Verified;
    }

    /// Whether the account is archived
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Archive the account (disables login until restored)
    pub fn mark_deleted(&mut self) {
        self.deleted_at = Some(Utc::now());
    }

    /// Restore an archived account
    ///
    /// Clears the marker, resets the login counter and re-verifies the
    /// account so the owner can log in again immediately.
    pub fn restore(&mut self) {
        self.deleted_at = None;
        self.login_attempts = MAX_LOGIN_ATTEMPTS;
        self.status = UserStatus::Verified;
    }
}
