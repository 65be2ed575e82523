use super::{is_email, is_zero_time, ViolationKind, Violations};
use crate::model::{UserId, UserUpdate};
use crate::wire::UpdateRequest;

/// Trimmed value of an optional display field; blank means "not provided".
fn provided(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Decode a partial update for `id`.
///
/// Only `updated-at` is mandatory. A field that is absent or blank is left
/// unchanged by the merge. A non-blank email must still be address-shaped.
pub fn decode_update(req: UpdateRequest, id: UserId) -> Result<UserUpdate, Violations> {
    let mut v = Violations::new();

    let login = provided(req.login.as_deref());
    let first_name = provided(req.first_name.as_deref());
    let last_name = provided(req.last_name.as_deref());
    let email = provided(req.email.as_deref());
    if email.as_deref().is_some_and(|e| !is_email(e)) {
        v.push("email", ViolationKind::Invalid);
    }
    // passwords are kept verbatim
    let password = req.password.filter(|p| !p.trim().is_empty());
    let updated_at = req.updated_at.filter(|t| !is_zero_time(Some(t)));
    if updated_at.is_none() {
        v.push("updated-at", ViolationKind::Invalid);
    }

    match updated_at {
        Some(updated_at) if v.is_empty() => {
            Ok(UserUpdate { id, updated_at, login, first_name, last_name, email, password })
        }
        _ => Err(v),
    }
}
