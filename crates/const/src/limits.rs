//! Business constraint constants.

/// Consecutive failed logins before an account is disabled.
pub const MAX_LOGIN_ATTEMPTS: i32 = 3;

/// Failed email-verification attempts before an account is disabled.
pub const MAX_VERIFICATION_ATTEMPTS: i32 = 3;

/// Minimum password length for user accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Decimal digits in an email verification code.
pub const VERIFICATION_CODE_LENGTH: usize = 6;
