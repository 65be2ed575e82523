//! Wire request → domain value decoding.
//!
//! Each decoder reads every field, applies its rules without stopping at the
//! first failure, and reports all problems at once as a [`Violations`] list.
//! The list is kept sorted by field name as entries are added, so the rendered
//! message is the same no matter which rule ran first.

mod login;
mod register;
mod update;

pub use login::decode_login;
pub use register::{decode_register, decode_register_at};
pub use update::decode_update;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Empty,
    Invalid,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Empty => "empty",
            ViolationKind::Invalid => "invalid",
        }
    }
}

/// Field violations ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    entries: Vec<(&'static str, ViolationKind)>,
}

impl Violations {
    pub fn new() -> Self { Self::default() }

    /// Record a violation; a field reported twice keeps its first kind.
    pub fn push(&mut self, field: &'static str, kind: ViolationKind) {
        match self.entries.binary_search_by(|(f, _)| f.cmp(&field)) {
            Ok(_) => {}
            Err(pos) => self.entries.insert(pos, (field, kind)),
        }
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn kind_of(&self, field: &str) -> Option<ViolationKind> {
        self.entries.iter().find(|(f, _)| *f == field).map(|(_, k)| *k)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn finish(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, (field, kind)) in self.entries.iter().enumerate() {
            if i > 0 { f.write_str(",")?; }
            write!(f, "{{{}:{}}}", field, kind.as_str())?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

pub(crate) fn is_email(s: &str) -> bool { RE_EMAIL.is_match(s) }

/// An absent timestamp and the Unix epoch both count as zero.
pub(crate) fn is_zero_time(ts: Option<&DateTime<Utc>>) -> bool {
    match ts {
        None => true,
        Some(t) => t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0,
    }
}

/// Trimmed copy of a required display string, recording `Empty` when blank.
pub(crate) fn required_text(raw: &str, field: &'static str, v: &mut Violations) -> String {
    let s = raw.trim();
    if s.is_empty() { v.push(field, ViolationKind::Empty); }
    s.to_string()
}

/// Trimmed copy of an email, recording `Invalid` when it is not address-shaped.
pub(crate) fn required_email(raw: &str, field: &'static str, v: &mut Violations) -> String {
    let s = raw.trim();
    if !is_email(s) { v.push(field, ViolationKind::Invalid); }
    s.to_string()
}

/// Passwords are checked for blankness but kept verbatim.
pub(crate) fn required_password(raw: &str, field: &'static str, v: &mut Violations) -> String {
    if raw.trim().is_empty() { v.push(field, ViolationKind::Empty); }
    raw.to_string()
}
