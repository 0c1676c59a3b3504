use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for route and capability lookups.
///
/// Roles are opaque, case-sensitive strings. The constants below name the
/// roles the builtin permission table knows about; any other string is still a
/// valid role and simply resolves to an empty permission entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const COACH: Role = Role(Cow::Borrowed("coach"));
    pub const STUDENT: Role = Role(Cow::Borrowed("student"));
    pub const ORGANIZATION: Role = Role(Cow::Borrowed("organization"));
    pub const TEAM_LEAD: Role = Role(Cow::Borrowed("team-lead"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
