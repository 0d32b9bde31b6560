#![deny(unsafe_code)]

//! # Albar Core
//!
//! Core business logic for the Albar API.
//!
//! ## Imports
//!
//! Import types from their source crates:
//! - Entity types: `albar_types::entities`
//! - Errors: `albar_types::Error`
//! - Config: `albar_config::Config`

pub mod access;
pub mod auth;
pub mod email;
pub mod id;
pub mod ipfs;
pub mod jwt;
pub mod logging;
pub mod notify;
pub mod pdf;
pub mod repository;

pub use access::{can_access, can_access_note};
pub use auth::{
    generate_reset_token, generate_temp_password, generate_verification_code, hash_password,
    verify_password,
};
pub use email::{
    EmailSender, EmailService, EmailTemplate, InvitationEmailTemplate, MockEmailSender,
    PasswordResetEmailTemplate, SmtpEmailService, VerificationEmailTemplate,
};
pub use id::IdGenerator;
pub use ipfs::{IpfsFile, IpfsUploader, MockIpfsUploader, PinataUploader};
pub use jwt::{AccessClaims, TokenService};
pub use notify::{AlertNotifier, MockAlertNotifier, WebhookNotifier};
pub use pdf::{MockPdfRenderer, NoteDocument, NoteLine, PdfRenderer, PrintPdfRenderer};
pub use repository::{
    ClientRepository, DeliveryNoteRepository, ProjectRepository, UserRepository,
};
