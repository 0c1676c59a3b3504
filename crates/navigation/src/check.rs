use serde::Serialize;

use gatehouse_auth::{PermissionTable, Role};

/// Result of checking one path against a role's route patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCheck {
    pub role: Role,
    pub path: String,
    pub allowed: bool,
    pub matched_pattern: Option<String>,
}

impl RouteCheck {
    pub fn evaluate(table: &PermissionTable, role: &Role, path: &str) -> Self {
        let matched_pattern = table
            .matched_pattern(role, path)
            .map(|p| p.as_str().to_string());
        Self {
            role: role.clone(),
            path: path.to_string(),
            allowed: matched_pattern.is_some(),
            matched_pattern,
        }
    }
}
