pub mod client;
pub mod delivery_note;
pub mod project;
pub mod user;

pub use client::Client;
pub use delivery_note::{DeliveryNote, NoteEntry, NoteKind};
pub use project::Project;
pub use user::{CompanyData, PersonalData, User, UserRole, UserStatus};
