use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableDatabase};

use crate::db::codec::{load, remove, store};
use crate::db::tables;
use crate::error::Result;
use crate::models::{new_id, Profile, SessionRecord};

/// Start a session for `user_id`; returns the new session id
pub fn create_session(
    db: &Database,
    user_id: &str,
    now: DateTime<Utc>,
    ttl_secs: i64,
) -> Result<String> {
    let session_id = new_id();
    let record = SessionRecord {
        user_id: user_id.to_string(),
        created_at: now,
        expires_at: now + Duration::seconds(ttl_secs),
    };

    let write_txn = db.begin_write()?;
    {
        let mut sessions = write_txn.open_table(tables::SESSIONS)?;
        store(&mut sessions, &session_id, &record)?;
    }
    write_txn.commit()?;

    Ok(session_id)
}

/// Profile behind a live session.
///
/// Expired sessions are deleted on the way out; a session whose profile is
/// gone resolves to `None`.
pub fn resolve_session(
    db: &Database,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Profile>> {
    let session: Option<SessionRecord> = {
        let read_txn = db.begin_read()?;
        let sessions = read_txn.open_table(tables::SESSIONS)?;
        load(&sessions, session_id)?
    };

    let Some(session) = session else {
        return Ok(None);
    };

    if session.is_expired(now) {
        tracing::debug!("Session expired for user {}", session.user_id);
        delete_session(db, session_id)?;
        return Ok(None);
    }

    let read_txn = db.begin_read()?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    load(&profiles, &session.user_id)
}

/// Returns whether a session was removed
pub fn delete_session(db: &Database, session_id: &str) -> Result<bool> {
    let write_txn = db.begin_write()?;
    let removed = {
        let mut sessions = write_txn.open_table(tables::SESSIONS)?;
        remove(&mut sessions, session_id)?
    };
    write_txn.commit()?;
    Ok(removed)
}
