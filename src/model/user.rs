use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned identity. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(UserId(raw)) }
    }

    pub fn get(self) -> u64 { self.0 }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user id {0:?}")]
pub struct InvalidUserId(pub String);

impl FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().ok().and_then(UserId::new).ok_or_else(|| InvalidUserId(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub login: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A validated registration. `password` holds plaintext until the service hashes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub login: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A validated partial update of one user.
///
/// `None` means "leave unchanged"; every `Some` carries a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub id: UserId,
    pub updated_at: DateTime<Utc>,
    pub login: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Hashed by the service before the update is merged.
    pub password: Option<String>,
}

impl UserUpdate {
    /// An update that only moves the timestamp.
    pub fn touch(id: UserId, updated_at: DateTime<Utc>) -> Self {
        UserUpdate { id, updated_at, login: None, first_name: None, last_name: None, email: None, password: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error("different ids: stored {stored}, proposed {proposed}")]
    IdentityMismatch { stored: UserId, proposed: UserId },
    #[error("update at {proposed} is not after {latest}")]
    NotNewer { latest: DateTime<Utc>, proposed: DateTime<Utc> },
}

impl User {
    /// Latest instant recorded on this user: the last update, else creation.
    pub fn latest_write(&self) -> DateTime<Utc> {
        match self.updated_at {
            Some(u) if u > self.created_at => u,
            _ => self.created_at,
        }
    }

    /// Merge `update` into a copy of this record.
    ///
    /// The update must be for the same user and strictly later than both the
    /// creation time and any previous update. Provided fields overwrite,
    /// absent ones are kept, and `updated_at` always moves to the update's time.
    pub fn merge(&self, update: &UserUpdate) -> Result<User, UpdateError> {
        if self.id != update.id {
            return Err(UpdateError::IdentityMismatch { stored: self.id, proposed: update.id });
        }
        let newer_than_created = self.created_at < update.updated_at;
        let newer_than_updated = self.updated_at.map_or(true, |prev| prev < update.updated_at);
        if !newer_than_created || !newer_than_updated {
            return Err(UpdateError::NotNewer { latest: self.latest_write(), proposed: update.updated_at });
        }

        let mut merged = self.clone();
        if let Some(login) = &update.login { merged.login = login.clone(); }
        if let Some(first) = &update.first_name { merged.first_name = first.clone(); }
        if let Some(last) = &update.last_name { merged.last_name = Some(last.clone()); }
        if let Some(email) = &update.email { merged.email = email.clone(); }
        if let Some(hash) = &update.password { merged.password_hash = hash.clone(); }
        merged.updated_at = Some(update.updated_at);
        Ok(merged)
    }
}

/// What a caller may see of a user. There is no password field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub login: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        UserView {
            id: u.id,
            login: u.login.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn stored() -> User {
        User {
            id: UserId::new(7).unwrap(),
            login: "ekvo".into(),
            password_hash: "$argon2id$stored".into(),
            first_name: "Eva".into(),
            last_name: Some("Kovac".into()),
            email: "eva@example.com".into(),
            created_at: t0(),
            updated_at: None,
        }
    }

    #[test]
    fn user_id_rejects_zero() {
        assert!(UserId::new(0).is_none());
        assert!("0".parse::<UserId>().is_err());
        assert!("-3".parse::<UserId>().is_err());
        assert_eq!("42".parse::<UserId>().unwrap().get(), 42);
    }

    #[test]
    fn update_must_be_after_creation() {
        let u = stored();
        let at_creation = UserUpdate::touch(u.id, t0());
        assert!(matches!(u.merge(&at_creation), Err(UpdateError::NotNewer { .. })));
        let before = UserUpdate::touch(u.id, t0() - Duration::seconds(1));
        assert!(matches!(u.merge(&before), Err(UpdateError::NotNewer { .. })));
        let after = UserUpdate::touch(u.id, t0() + Duration::seconds(1));
        let merged = u.merge(&after).unwrap();
        assert_eq!(merged.updated_at, Some(t0() + Duration::seconds(1)));
    }

    #[test]
    fn second_update_must_be_after_first() {
        let first_at = t0() + Duration::minutes(5);
        let u = stored().merge(&UserUpdate::touch(UserId::new(7).unwrap(), first_at)).unwrap();

        let same = UserUpdate::touch(u.id, first_at);
        assert!(matches!(u.merge(&same), Err(UpdateError::NotNewer { .. })));
        let earlier = UserUpdate::touch(u.id, first_at - Duration::minutes(1));
        assert!(matches!(u.merge(&earlier), Err(UpdateError::NotNewer { .. })));
        let later = UserUpdate::touch(u.id, first_at + Duration::nanoseconds(1));
        assert!(u.merge(&later).is_ok());
    }

    #[test]
    fn identity_mismatch_is_checked_first() {
        let u = stored();
        let other = UserUpdate::touch(UserId::new(8).unwrap(), t0() - Duration::days(1));
        assert_eq!(
            u.merge(&other),
            Err(UpdateError::IdentityMismatch { stored: u.id, proposed: other.id })
        );
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let u = stored();
        let mut upd = UserUpdate::touch(u.id, t0() + Duration::hours(1));
        upd.first_name = Some("Evelyn".into());
        let merged = u.merge(&upd).unwrap();
        assert_eq!(merged.first_name, "Evelyn");
        assert_eq!(merged.login, u.login);
        assert_eq!(merged.email, u.email);
        assert_eq!(merged.last_name, u.last_name);
        assert_eq!(merged.password_hash, u.password_hash);
        assert_eq!(merged.created_at, u.created_at);
    }

    #[test]
    fn last_name_is_set_but_never_cleared() {
        let mut u = stored();
        u.last_name = None;
        let mut upd = UserUpdate::touch(u.id, t0() + Duration::hours(1));
        upd.last_name = Some("Novak".into());
        assert_eq!(u.merge(&upd).unwrap().last_name.as_deref(), Some("Novak"));

        let kept = stored().merge(&UserUpdate::touch(u.id, t0() + Duration::hours(1))).unwrap();
        assert_eq!(kept.last_name.as_deref(), Some("Kovac"));
    }

    #[test]
    fn failed_merge_leaves_stored_record_alone() {
        let u = stored();
        let mut upd = UserUpdate::touch(u.id, t0());
        upd.login = Some("other".into());
        assert!(u.merge(&upd).is_err());
        assert_eq!(u, stored());
    }

    #[test]
    fn view_has_no_password() {
        let v = UserView::from(&stored());
        let json = serde_json::to_value(&v).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["id"], 7);
    }
}
