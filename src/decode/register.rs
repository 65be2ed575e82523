use chrono::{DateTime, Utc};

use super::{is_zero_time, required_email, required_password, required_text, ViolationKind, Violations};
use crate::model::NewUser;
use crate::wire::RegisterRequest;

pub fn decode_register(req: RegisterRequest) -> Result<NewUser, Violations> {
    decode_register_at(req, Utc::now())
}

/// Same as [`decode_register`], judging "in the future" against `now`.
pub fn decode_register_at(req: RegisterRequest, now: DateTime<Utc>) -> Result<NewUser, Violations> {
    let mut v = Violations::new();

    let login = required_text(&req.login, "login", &mut v);
    let first_name = required_text(&req.first_name, "first-name", &mut v);
    let email = required_email(&req.email, "email", &mut v);
    let password = required_password(&req.password, "password", &mut v);
    let last_name = req
        .last_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let created_at = req.created_at.filter(|t| !is_zero_time(Some(t)) && *t <= now);
    if created_at.is_none() {
        v.push("created-at", ViolationKind::Invalid);
    }

    match created_at {
        Some(created_at) if v.is_empty() => {
            Ok(NewUser { login, password, first_name, last_name, email, created_at })
        }
        _ => Err(v),
    }
}
