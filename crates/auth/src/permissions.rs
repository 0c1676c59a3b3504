//! Role → route/capability permission table.
//!
//! The table is plain data: it is loaded once (from JSON or the builtin
//! policy), validated, and then shared immutably. A role with no entry gets
//! the empty entry: no routes, no capabilities.

use std::borrow::{Borrow, Cow};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;
use crate::route::{PatternError, RoutePattern};

const BUILTIN_POLICY: &str = include_str!("../policy/permissions.json");

/// Named capability flag (e.g. `"delete_records"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Capability {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum PermissionConfigError {
    #[error("failed to read permission table: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse permission table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("role '{0}' has more than one permission entry")]
    DuplicateRole(Role),

    #[error("role '{role}' has an invalid route pattern: {source}")]
    InvalidPattern {
        role: Role,
        #[source]
        source: PatternError,
    },
}

/// On-disk shape of the permission table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTableConfig {
    pub version: u32,
    pub entries: Vec<PermissionEntryConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntryConfig {
    pub role: Role,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub capabilities: BTreeMap<String, bool>,
}

/// What one role may reach and do.
///
/// The role is not stored here: it is the key the entry was looked up by
/// ([`PermissionTable::entry_for`]), which lets every unknown role share one
/// static empty entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionEntry {
    /// Checked in declared order; the first match is reported as the reason.
    pub route_patterns: Vec<RoutePattern>,
    pub capabilities: BTreeMap<Capability, bool>,
}

static EMPTY_ENTRY: PermissionEntry = PermissionEntry {
    route_patterns: Vec::new(),
    capabilities: BTreeMap::new(),
};

impl PermissionEntry {
    pub fn is_empty(&self) -> bool {
        self.route_patterns.is_empty() && self.capabilities.is_empty()
    }
}

/// Immutable role → permission mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    version: u32,
    entries: HashMap<Role, PermissionEntry>,
}

impl PermissionTable {
    pub fn from_config(config: PermissionTableConfig) -> Result<Self, PermissionConfigError> {
        let mut entries = HashMap::with_capacity(config.entries.len());

        for entry in config.entries {
            if entries.contains_key(&entry.role) {
                return Err(PermissionConfigError::DuplicateRole(entry.role));
            }

            let route_patterns = entry
                .routes
                .iter()
                .map(|raw| RoutePattern::parse(raw))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| PermissionConfigError::InvalidPattern {
                    role: entry.role.clone(),
                    source,
                })?;

            let capabilities = entry
                .capabilities
                .into_iter()
                .map(|(name, granted)| (Capability::new(name), granted))
                .collect();

            entries.insert(
                entry.role,
                PermissionEntry {
                    route_patterns,
                    capabilities,
                },
            );
        }

        tracing::debug!(
            version = config.version,
            roles = entries.len(),
            "permission table loaded"
        );

        Ok(Self {
            version: config.version,
            entries,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, PermissionConfigError> {
        let config: PermissionTableConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PermissionConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// The policy shipped with the crate (admin, coach, student, organization, team-lead).
    pub fn builtin() -> Result<Self, PermissionConfigError> {
        Self::from_json_str(BUILTIN_POLICY)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Roles with an explicit entry, sorted.
    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.entries.keys().collect();
        roles.sort();
        roles
    }

    pub fn entry_for(&self, role: &Role) -> &PermissionEntry {
        self.entries.get(role).unwrap_or(&EMPTY_ENTRY)
    }

    pub fn is_route_allowed(&self, role: &Role, path: &str) -> bool {
        self.matched_pattern(role, path).is_some()
    }

    /// First pattern (in declared order) granting `role` access to `path`.
    pub fn matched_pattern(&self, role: &Role, path: &str) -> Option<&RoutePattern> {
        self.entry_for(role)
            .route_patterns
            .iter()
            .find(|p| p.matches(path))
    }

    pub fn has_capability(&self, role: &Role, name: &str) -> bool {
        self.entry_for(role)
            .capabilities
            .get(name)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PermissionTable {
        PermissionTable::builtin().unwrap()
    }

    #[test]
    fn builtin_policy_loads() {
        let table = table();
        assert_eq!(table.version(), 1);
        assert_eq!(
            table.roles(),
            vec![
                &Role::ADMIN,
                &Role::COACH,
                &Role::ORGANIZATION,
                &Role::STUDENT,
                &Role::TEAM_LEAD
            ]
        );
    }

    #[test]
    fn coach_reaches_students_list_and_detail() {
        let table = table();
        assert!(table.is_route_allowed(&Role::COACH, "/students"));
        assert!(table.is_route_allowed(&Role::COACH, "/students/42"));
        assert!(!table.is_route_allowed(&Role::COACH, "/students/42/grades"));
        assert_eq!(
            table
                .matched_pattern(&Role::COACH, "/students/42")
                .map(RoutePattern::as_str),
            Some("/students/:id")
        );
    }

    #[test]
    fn student_cannot_reach_companies() {
        assert!(!table().is_route_allowed(&Role::STUDENT, "/companies"));
    }

    #[test]
    fn unknown_role_gets_empty_entry() {
        let table = table();
        let ghost = Role::new("ghost");
        assert!(table.entry_for(&ghost).is_empty());
        assert!(!table.is_route_allowed(&ghost, "/"));
        assert!(!table.has_capability(&ghost, "view_reports"));
    }

    #[test]
    fn capabilities_default_to_false() {
        let table = table();
        assert!(table.has_capability(&Role::ADMIN, "delete_records"));
        assert!(!table.has_capability(&Role::COACH, "delete_records"));
        assert!(!table.has_capability(&Role::STUDENT, "delete_records"));
        assert!(!table.has_capability(&Role::ADMIN, "no_such_flag"));
    }

    #[test]
    fn duplicate_roles_are_rejected() {
        let json = r#"{
            "version": 2,
            "entries": [
                { "role": "coach", "routes": ["/a"] },
                { "role": "coach", "routes": ["/b"] }
            ]
        }"#;
        let err = PermissionTable::from_json_str(json).unwrap_err();
        assert!(matches!(err, PermissionConfigError::DuplicateRole(r) if r == Role::COACH));
    }

    #[test]
    fn invalid_patterns_are_rejected_with_role_context() {
        let json = r#"{ "version": 1, "entries": [ { "role": "admin", "routes": ["/x/:"] } ] }"#;
        let err = PermissionTable::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            PermissionConfigError::InvalidPattern { ref role, .. } if *role == Role::ADMIN
        ));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let json = r#"{ "version": 3, "entries": [ { "role": "auditor" } ] }"#;
        let table = PermissionTable::from_json_str(json).unwrap();
        assert!(table.entry_for(&Role::new("auditor")).is_empty());
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = PermissionTable::from_path("/nonexistent/permissions.json").unwrap_err();
        assert!(matches!(err, PermissionConfigError::Io(_)));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every builtin pattern admits any substitution of its
            /// parameters, and rejects paths of a different arity.
            #[test]
            fn builtin_patterns_admit_substitutions(value in "[A-Za-z0-9_.~-]{1,12}") {
                let table = table();
                for role in table.roles() {
                    for pattern in &table.entry_for(role).route_patterns {
                        let path: String = pattern
                            .as_str()
                            .split('/')
                            .map(|seg| if seg.starts_with(':') { value.as_str() } else { seg })
                            .collect::<Vec<_>>()
                            .join("/");
                        prop_assert!(table.is_route_allowed(role, &path));
                    }
                    let deep = format!("/{value}/{value}/{value}/{value}");
                    prop_assert!(!table.is_route_allowed(role, &deep));
                }
            }
        }
    }
}
