//! Request extractors that turn a bearer token into a profile and gate it by
//! access level.
//!
//! - [`SignedIn`]: any valid session, whatever the account state
//! - [`Reader`]: verified, not blocked; may read every board
//! - [`Contributor`]: may also post, comment, vote and delete their own content
//! - [`Admin`]: role and verification procedures

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

use crate::clock;
use crate::error::{AppError, Result};
use crate::models::{Access, Profile};
use crate::repo::sessions;
use crate::security::open_session_token;
use crate::AppState;

/// Any signed-in account, including blocked and unverified ones
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub profile: Profile,
    pub session_id: String,
}

#[derive(Debug, Clone)]
pub struct Reader(pub Profile);

#[derive(Debug, Clone)]
pub struct Contributor(pub Profile);

#[derive(Debug, Clone)]
pub struct Admin(pub Profile);

/// Check `profile` against the level a route needs.
///
/// Blocked and pending accounts get their own errors so clients can show
/// the right screen instead of tab content.
pub fn require(profile: &Profile, needed: Access) -> Result<()> {
    match profile.access() {
        Access::Blocked => Err(AppError::Blocked),
        Access::PendingVerification => Err(AppError::VerificationPending),
        level if level >= needed => Ok(()),
        _ if needed == Access::Admin => Err(AppError::AdminOnly),
        _ => Err(AppError::ReadOnly),
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        // Forged tokens never reach the database
        let session_id = open_session_token(token, &state.config.app_secret_key)
            .ok_or_else(|| {
                tracing::warn!("Rejected session token with bad signature");
                AppError::Unauthorized
            })?;

        let lookup = session_id.clone();
        let profile = state
            .with_db(move |db| sessions::resolve_session(db, &lookup, clock::now()))
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(SignedIn {
            profile,
            session_id,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Reader {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let SignedIn { profile, .. } = SignedIn::from_request_parts(parts, state).await?;
        require(&profile, Access::ReadOnly)?;
        Ok(Reader(profile))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Contributor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let SignedIn { profile, .. } = SignedIn::from_request_parts(parts, state).await?;
        require(&profile, Access::Member)?;
        Ok(Contributor(profile))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let SignedIn { profile, .. } = SignedIn::from_request_parts(parts, state).await?;
        require(&profile, Access::Admin)?;
        Ok(Admin(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn profile(role: Role, is_verified: bool) -> Profile {
        Profile {
            id: "u1".to_string(),
            email: "u1@hook.coop".to_string(),
            user_name: "U1".to_string(),
            coop_name: "Coop".to_string(),
            building_address: "Coop".to_string(),
            unit_number: String::new(),
            avatar_url: String::new(),
            role,
            is_verified,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_gates() {
        let member = profile(Role::Full, true);
        assert!(require(&member, Access::ReadOnly).is_ok());
        assert!(require(&member, Access::Member).is_ok());
        assert!(matches!(
            require(&member, Access::Admin),
            Err(AppError::AdminOnly)
        ));

        let limited = profile(Role::Limited, true);
        assert!(require(&limited, Access::ReadOnly).is_ok());
        assert!(matches!(
            require(&limited, Access::Member),
            Err(AppError::ReadOnly)
        ));

        let admin = profile(Role::Admin, false);
        assert!(require(&admin, Access::Admin).is_ok());
    }

    #[test]
    fn test_require_blocked_and_pending_first() {
        assert!(matches!(
            require(&profile(Role::Blocked, true), Access::ReadOnly),
            Err(AppError::Blocked)
        ));
        assert!(matches!(
            require(&profile(Role::Full, false), Access::ReadOnly),
            Err(AppError::VerificationPending)
        ));
    }
}
