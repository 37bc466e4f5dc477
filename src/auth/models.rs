use serde::{Deserialize, Serialize};

/// Role granting edit controls on every document in the UI.
pub const ADMIN_ROLE: &str = "admin";

/// Represents an authenticated caller, as carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Stable user identifier, stored as `userId` on owned documents.
    pub user_id: String,
    /// User email address, stored as `userEmail` on owned documents.
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn owns(&self, owner_id: Option<&str>) -> bool {
        owner_id == Some(self.user_id.as_str())
    }

    /// Whether edit, copy and delete controls should be offered.
    ///
    /// Purely a presentation decision. The server re-checks ownership on
    /// every mutation and never special-cases admins.
    pub fn can_manage(&self, owner_id: Option<&str>) -> bool {
        self.is_admin() || self.owns(owner_id)
    }
}
