//! Ownership predicates shared by every entity service.
//!
//! Clients and projects are visible to their creator and to anyone sharing
//! the creator's company cif. Delivery notes use explicit teammate lists
//! instead: the creator's `company_users` enumerates who else may see them.
//! Handlers answer 404 when a record is absent and 403 when it exists but
//! the predicate fails; the two cases are never folded together.

use albar_types::entities::{DeliveryNote, User};

/// Whether `user` may read, write or delete a client/project-style resource
///
/// True when the user created the resource, or when the resource carries a
/// company identifier equal to the user's own company cif.
pub fn can_access(user: &User, created_by: i64, company_id: Option<&str>) -> bool {
    if created_by == user.id {
        return true;
    }
    match (company_id, user.company_cif()) {
        (Some(resource_cif), Some(user_cif)) => resource_cif == user_cif,
        _ => false,
    }
}

/// Whether `user` may access a delivery note created by `creator`
///
/// True for the creator, or when the creator's teammate list names the user.
pub fn can_access_note(user: &User, creator: &User, note: &DeliveryNote) -> bool {
    note.created_by == user.id || creator.company_users.contains(&user.id)
}
