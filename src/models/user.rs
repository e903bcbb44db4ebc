use serde::{Deserialize, Serialize};

/// Access tier granted on a diagram. Also doubles as the account-level
/// default role shown on the profile; per-diagram capability always comes
/// from the permission resolver, never from this field alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed-in account as the rest of the app sees it. Credential material
/// never leaves the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Editor).ok(), Some("\"editor\"".to_string()));
        assert_eq!(serde_json::to_string(&Role::Viewer).ok(), Some("\"viewer\"".to_string()));

        let parsed: Role = serde_json::from_str("\"viewer\"").expect("role should parse");
        assert_eq!(parsed, Role::Viewer);
    }

    #[test]
    fn test_role_display_matches_wire_form() {
        assert_eq!(Role::Editor.to_string(), "editor");
        assert_eq!(Role::Viewer.to_string(), "viewer");
    }
}
