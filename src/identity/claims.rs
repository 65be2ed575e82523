use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{InvalidUserId, UserId};

/// Claim holding the subject's user id as a decimal string.
pub const SUBJECT_CLAIM: &str = "user_id";

/// String claims carried by a bearer token (expiry excluded).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, String>);

impl Claims {
    pub fn new() -> Self { Self::default() }

    pub fn for_subject(id: UserId) -> Self {
        let mut c = Claims::new();
        c.insert(SUBJECT_CLAIM, id.to_string());
        c
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> { self.0.get(key).map(String::as_str) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The subject's identity, if the claim is present and a positive integer.
    pub fn subject(&self) -> Result<UserId, InvalidUserId> {
        match self.get(SUBJECT_CLAIM) {
            Some(raw) => raw.parse(),
            None => Err(InvalidUserId(String::new())),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Claims(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
