/// Shared types used across the codebase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles. The role decides which resource policy grant applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Client,
    Administrator,
    SuperUser,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Client, Role::Administrator, Role::SuperUser];
    pub const STAFF: &'static [Role] = &[Role::Administrator, Role::SuperUser];

    /// Name as stored in `roles.name`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Administrator => "Administrator",
            Role::SuperUser => "SuperUser",
        }
    }

    /// Fixed id the role is seeded with in `roles`
    pub fn id(&self) -> Uuid {
        let id = match self {
            Role::Client => 0x5654ad77_943e_4f72_bb2f_2751c54128f0,
            Role::Administrator => 0x6c8a2a6e_6df4_4fa7_8cb8_1757d68345d8,
            Role::SuperUser => 0x3777addd_b138_42d3_9bfe_e7c089d501ac,
        };
        Uuid::from_u128(id)
    }

    pub fn from_id(id: Uuid) -> Option<Role> {
        Role::ALL.iter().copied().find(|role| role.id() == id)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older databases carry the Spanish profile names
        match s.trim() {
            "Client" | "Cliente" => Ok(Role::Client),
            "Administrator" | "Administrador" => Ok(Role::Administrator),
            "SuperUser" | "SuperUsuario" => Ok(Role::SuperUser),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Operations a resource policy grants per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// The authenticated identity a protected operation runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

/// Parse an identifier in canonical 8-4-4-4-12 hex form (either case).
/// Braced, URN and simple forms that `Uuid::parse_str` also accepts are refused.
pub fn canonical_uuid(s: &str) -> Option<Uuid> {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return None;
    }
    let well_formed = bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        _ => b.is_ascii_hexdigit(),
    });
    if !well_formed {
        return None;
    }
    Uuid::parse_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_and_legacy_role_names() {
        assert_eq!("Client".parse::<Role>().unwrap(), Role::Client);
        assert_eq!("SuperUsuario".parse::<Role>().unwrap(), Role::SuperUser);
        assert_eq!(" Administrator ".parse::<Role>().unwrap(), Role::Administrator);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn staff_roles() {
        assert!(!Role::STAFF.contains(&Role::Client));
        assert!(Role::STAFF.contains(&Role::Administrator));
        assert!(Role::STAFF.contains(&Role::SuperUser));
        assert_eq!(Role::default(), Role::Client);
    }

    #[test]
    fn seeded_role_ids() {
        assert_eq!(Role::Client.id().to_string(), "5654ad77-943e-4f72-bb2f-2751c54128f0");
        assert_eq!(Role::Administrator.id().to_string(), "6c8a2a6e-6df4-4fa7-8cb8-1757d68345d8");
        assert_eq!(Role::SuperUser.id().to_string(), "3777addd-b138-42d3-9bfe-e7c089d501ac");
        assert_eq!(Role::from_id(Role::SuperUser.id()), Some(Role::SuperUser));
        assert_eq!(Role::from_id(Uuid::nil()), None);
    }

    #[test]
    fn canonical_uuid_accepts_both_cases() {
        let lower = "5654ad77-943e-4f72-bb2f-2751c54128f0";
        let upper = lower.to_uppercase();
        assert_eq!(canonical_uuid(lower), canonical_uuid(&upper));
        assert!(canonical_uuid(lower).is_some());
    }

    #[test]
    fn canonical_uuid_rejects_other_forms() {
        assert!(canonical_uuid("not-a-uuid").is_none());
        assert!(canonical_uuid("5654ad77943e4f72bb2f2751c54128f0").is_none());
        assert!(canonical_uuid("{5654ad77-943e-4f72-bb2f-2751c54128f0}").is_none());
        assert!(canonical_uuid("5654ad77-943e-4f72-bb2f-2751c54128fg").is_none());
        assert!(canonical_uuid("5654ad7-7943e-4f72-bb2f-2751c54128f0").is_none());
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Update.to_string(), "update");
    }
}
