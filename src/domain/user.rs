use serde::{Deserialize, Serialize};

/// Opaque caller principal. The surrounding trust layer verifies it;
/// here it is only an equality-compared key for per-user state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(principal: impl Into<String>) -> Self {
        Self(principal.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can mutate the catalog and assign roles
    Admin,
    /// Registered identity with an account or profile
    User,
    /// Unknown identity, read-only by policy
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Guest => "guest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            "guest" => Some(UserRole::Guest),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display profile for an identity. Created on first save, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Admin, UserRole::User, UserRole::Guest] {
            let s = role.as_str();
            let parsed = UserRole::from_str(s).unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert_eq!(UserRole::from_str("root"), None);
        assert_eq!(UserRole::from_str(""), None);
    }

    #[test]
    fn test_identity_equality() {
        let a = Identity::new("aaaa-bbbb");
        let b = Identity::new("aaaa-bbbb");
        let c = Identity::new("cccc-dddd");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
