/// Role and capability checks
///
/// Users carry an integer `role_id`. It is mapped once to a [`Role`] and every
/// permission decision goes through [`has_capability`], so handlers never
/// compare role ids directly.
///
/// # Roles
///
/// | id | Role            | Admin UI |
/// |----|-----------------|----------|
/// | 1  | Default         | no       |
/// | 2  | Vip             | no       |
/// | 3  | Support         | no       |
/// | 4  | SupportLvl2     | no       |
/// | 5  | SupportLvl3     | no       |
/// | 6  | SupportLvl4     | no       |
/// | 7  | Admin           | yes      |
/// | 8  | Administrator   | yes      |
/// | 9  | Owner           | yes      |
///
/// # Example
///
/// ```
/// use mythicaldash_shared::auth::authorization::{has_capability, Capability, Role};
///
/// assert!(has_capability(Role::from_id(9), Capability::ManageSettings));
/// assert!(!has_capability(Role::from_id(1), Capability::AdminUiAccess));
/// ```

use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Role does not grant the capability
    #[error("Role {role:?} lacks capability {capability:?}")]
    MissingCapability { role: Role, capability: Capability },
}

/// User roles, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Default,
    Vip,
    Support,
    SupportLvl2,
    SupportLvl3,
    SupportLvl4,
    Admin,
    Administrator,
    Owner,
}

/// Roles allowed into the admin area
pub const ADMIN_ROLES: [Role; 3] = [Role::Admin, Role::Administrator, Role::Owner];

impl Role {
    /// Maps a stored role id to a role
    ///
    /// Unknown ids map to `Default` so a corrupted row never grants privileges.
    pub fn from_id(id: i32) -> Self {
        match id {
            2 => Role::Vip,
            3 => Role::Support,
            4 => Role::SupportLvl2,
            5 => Role::SupportLvl3,
            6 => Role::SupportLvl4,
            7 => Role::Admin,
            8 => Role::Administrator,
            9 => Role::Owner,
            _ => Role::Default,
        }
    }

    /// Returns the stored role id
    pub fn id(&self) -> i32 {
        match self {
            Role::Default => 1,
            Role::Vip => 2,
            Role::Support => 3,
            Role::SupportLvl2 => 4,
            Role::SupportLvl3 => 5,
            Role::SupportLvl4 => 6,
            Role::Admin => 7,
            Role::Administrator => 8,
            Role::Owner => 9,
        }
    }

    /// Whether this role belongs to the admin set
    pub fn is_admin(&self) -> bool {
        ADMIN_ROLES.contains(self)
    }
}

/// Permissions that handlers check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Open the admin area and read its data
    AdminUiAccess,

    /// Change persisted settings
    ManageSettings,

    /// Read leaderboards
    ViewLeaderboard,

    /// Buy coins through a payment provider
    PurchaseCoins,

    /// Look up game panel accounts
    ViewPanelUsers,
}

/// Checks whether a role grants a capability
pub fn has_capability(role: Role, capability: Capability) -> bool {
    match capability {
        Capability::AdminUiAccess | Capability::ManageSettings | Capability::ViewPanelUsers => {
            role.is_admin()
        }
        Capability::ViewLeaderboard | Capability::PurchaseCoins => true,
    }
}

/// Requires that a user holds a capability
pub fn require_capability(user: &User, capability: Capability) -> Result<(), AuthzError> {
    let role = user.role();
    if !has_capability(role, capability) {
        return Err(AuthzError::MissingCapability { role, capability });
    }

    Ok(())
}
