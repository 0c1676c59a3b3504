use serde::{Deserialize, Serialize};

use gatehouse_core::{OrganizationId, PrincipalId};

use crate::Role;

/// The authenticated identity a navigation or action decision is made for.
///
/// A principal is an immutable snapshot supplied by the session layer. The
/// role always comes from the authentication result; nothing here infers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
    pub role: Role,
    /// Set when the holder must change their credential before using any
    /// other protected view.
    #[serde(default)]
    pub must_change_credential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_ref: Option<OrganizationId>,
}

impl Principal {
    pub fn new(id: PrincipalId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
            must_change_credential: false,
            organization_ref: None,
        }
    }

    pub fn with_forced_credential_change(mut self) -> Self {
        self.must_change_credential = true;
        self
    }

    pub fn with_organization(mut self, organization: OrganizationId) -> Self {
        self.organization_ref = Some(organization);
        self
    }
}
