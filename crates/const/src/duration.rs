//! Token lifetime constants.

/// Bearer access token lifetime (2 hours).
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 2 * 60 * 60;

/// Password-recovery token lifetime (15 minutes).
pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;
