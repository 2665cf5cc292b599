use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase};

use crate::constants::{MAX_LIST_ROWS, MAX_PROFILE_SEARCH_RESULTS};
use crate::db::codec::{exists, load, load_all, store};
use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::{
    new_id, AuthorSummary, CredentialRecord, NewAccount, Profile, Role, UserActivity,
};

/// Create profile, credentials and activity row for a new account.
///
/// `account` must already be validated; `password_hash` is the PHC string.
pub fn create_account(
    db: &Database,
    account: &NewAccount,
    password_hash: &str,
    role: Role,
    is_verified: bool,
    now: DateTime<Utc>,
) -> Result<Profile> {
    // Seeded by id so the public avatar URL never carries the email
    let id = new_id();
    let profile = Profile {
        avatar_url: Profile::default_avatar(&id),
        id,
        email: account.email.clone(),
        user_name: account.user_name.clone(),
        coop_name: account.building_address.clone(),
        building_address: account.building_address.clone(),
        unit_number: account.unit_number.clone(),
        role,
        is_verified,
        created_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        let mut credentials = write_txn.open_table(tables::CREDENTIALS)?;
        if exists(&credentials, &profile.email)? {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
        let credential = CredentialRecord {
            user_id: profile.id.clone(),
            password_hash: password_hash.to_string(),
        };
        store(&mut credentials, &profile.email, &credential)?;

        let mut profiles = write_txn.open_table(tables::PROFILES)?;
        store(&mut profiles, &profile.id, &profile)?;

        let mut activity = write_txn.open_table(tables::USER_ACTIVITY)?;
        store(&mut activity, &profile.id, &UserActivity::new(&profile.id, now))?;
    }
    write_txn.commit()?;

    tracing::info!("Created account {} ({:?})", profile.id, profile.role);
    Ok(profile)
}

/// Credentials for a (lowercased) email, if registered
pub fn find_credentials(db: &Database, email: &str) -> Result<Option<CredentialRecord>> {
    let read_txn = db.begin_read()?;
    let credentials = read_txn.open_table(tables::CREDENTIALS)?;
    load(&credentials, email)
}

pub fn get_profile(db: &Database, user_id: &str) -> Result<Option<Profile>> {
    let read_txn = db.begin_read()?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    load(&profiles, user_id)
}

/// Mention autocomplete: case-insensitive substring match on the user name.
///
/// Blocked accounts are never suggested. An empty query returns nothing.
pub fn search_profiles(db: &Database, query: &str) -> Result<Vec<AuthorSummary>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let read_txn = db.begin_read()?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut matches: Vec<Profile> = load_all::<Profile, _>(&profiles)?
        .into_iter()
        .filter(|p| p.role != Role::Blocked && p.user_name.to_lowercase().contains(&needle))
        .collect();
    matches.sort_by(|a, b| a.user_name.to_lowercase().cmp(&b.user_name.to_lowercase()));

    Ok(matches
        .iter()
        .take(MAX_PROFILE_SEARCH_RESULTS)
        .map(Profile::summary)
        .collect())
}

/// Admin user list, optionally filtered by name, email or co-op
pub fn list_users(db: &Database, search: Option<&str>, ascending: bool) -> Result<Vec<Profile>> {
    let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();

    let read_txn = db.begin_read()?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut users: Vec<Profile> = load_all::<Profile, _>(&profiles)?
        .into_iter()
        .filter(|p| {
            needle.is_empty()
                || p.user_name.to_lowercase().contains(&needle)
                || p.email.contains(&needle)
                || p.coop_name.to_lowercase().contains(&needle)
        })
        .collect();

    if ascending {
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    } else {
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
    users.truncate(MAX_LIST_ROWS);
    Ok(users)
}

pub fn update_role(db: &Database, user_id: &str, role: Role) -> Result<Profile> {
    update_profile(db, user_id, |profile| profile.role = role)
}

pub fn update_verification(db: &Database, user_id: &str, is_verified: bool) -> Result<Profile> {
    update_profile(db, user_id, |profile| profile.is_verified = is_verified)
}

fn update_profile(
    db: &Database,
    user_id: &str,
    apply: impl FnOnce(&mut Profile),
) -> Result<Profile> {
    let write_txn = db.begin_write()?;
    let profile = {
        let mut profiles = write_txn.open_table(tables::PROFILES)?;
        let mut profile: Profile = load(&profiles, user_id)?.ok_or(AppError::NotFound("User"))?;
        apply(&mut profile);
        store(&mut profiles, user_id, &profile)?;
        profile
    };
    write_txn.commit()?;

    tracing::info!(
        "Updated user {}: role={:?} verified={}",
        profile.id,
        profile.role,
        profile.is_verified
    );
    Ok(profile)
}
