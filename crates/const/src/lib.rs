//! # Albar Constants
//!
//! Zero-dependency crate containing constants used across the Albar
//! codebase:
//! - Attempt limits and input length constraints
//! - Token and code lifetimes

pub mod duration;
pub mod limits;

pub use duration::{ACCESS_TOKEN_TTL_SECONDS, RESET_TOKEN_TTL_MINUTES};
pub use limits::{
    MAX_LOGIN_ATTEMPTS, MAX_VERIFICATION_ATTEMPTS, MIN_PASSWORD_LENGTH,
    VERIFICATION_CODE_LENGTH,
};
