use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Community role assigned by administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Full,
    Limited,
    Blocked,
}

/// What a signed-in account may currently do
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Never sees tab content
    Blocked,
    /// Signed up but not yet confirmed as a resident
    PendingVerification,
    /// Verified, may read but not post
    ReadOnly,
    Member,
    Admin,
}

/// Resident profile, keyed by user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub coop_name: String,
    pub building_address: String,
    pub unit_number: String,
    pub avatar_url: String,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Blocked wins over everything; admins are never held for verification.
    pub fn access(&self) -> Access {
        match self.role {
            Role::Blocked => Access::Blocked,
            Role::Admin => Access::Admin,
            _ if !self.is_verified => Access::PendingVerification,
            Role::Limited => Access::ReadOnly,
            Role::Full => Access::Member,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.access() == Access::Admin
    }

    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id.clone(),
            user_name: self.user_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    /// Generated avatar for accounts that never uploaded one
    pub fn default_avatar(seed: &str) -> String {
        format!("https://api.dicebear.com/7.x/initials/svg?seed={}", seed)
    }
}

/// Public view of another resident (no email, no role)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub user_name: String,
    pub avatar_url: String,
}

impl AuthorSummary {
    /// Placeholder for rows whose profile no longer exists
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            user_name: "Unknown".to_string(),
            avatar_url: Profile::default_avatar(id),
        }
    }
}

/// Login material, keyed by lowercase email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Minimal shape check: one '@', non-empty local part, dotted domain
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role, is_verified: bool) -> Profile {
        Profile {
            id: "u1".to_string(),
            email: "a@b.org".to_string(),
            user_name: "Ada".to_string(),
            coop_name: "East River".to_string(),
            building_address: "East River".to_string(),
            unit_number: "4B".to_string(),
            avatar_url: Profile::default_avatar("u1"),
            role,
            is_verified,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_levels() {
        assert_eq!(profile(Role::Full, true).access(), Access::Member);
        assert_eq!(profile(Role::Full, false).access(), Access::PendingVerification);
        assert_eq!(profile(Role::Limited, true).access(), Access::ReadOnly);
        assert_eq!(profile(Role::Limited, false).access(), Access::PendingVerification);
        assert_eq!(profile(Role::Admin, false).access(), Access::Admin);
    }

    #[test]
    fn test_blocked_overrides_verification() {
        assert_eq!(profile(Role::Blocked, true).access(), Access::Blocked);
        assert_eq!(profile(Role::Blocked, false).access(), Access::Blocked);
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("resident@hook.coop"));
        assert!(!validate_email("resident"));
        assert!(!validate_email("@hook.coop"));
        assert!(!validate_email("a@b@hook.coop"));
        assert!(!validate_email("a@hook"));
        assert!(!validate_email("a b@hook.coop"));
    }
}
