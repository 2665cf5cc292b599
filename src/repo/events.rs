use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase};

use super::{charge_post, ensure_can_moderate, Authors};
use crate::constants::MAX_LIST_ROWS;
use crate::db::codec::{load, load_all, store};
use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::{new_id, Event, EventView, NewEvent, PostLimits, Profile};

/// Live events in calendar order
pub fn list_events(db: &Database) -> Result<Vec<EventView>> {
    let read_txn = db.begin_read()?;
    let events = read_txn.open_table(tables::EVENTS)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut authors = Authors::new(&profiles);

    let mut listed: Vec<Event> = load_all::<Event, _>(&events)?
        .into_iter()
        .filter(|e| !e.is_deleted())
        .collect();
    listed.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    listed.truncate(MAX_LIST_ROWS);

    listed
        .into_iter()
        .map(|event| -> Result<EventView> {
            Ok(EventView {
                creator: authors.get(&event.created_by)?,
                event,
            })
        })
        .collect()
}

pub fn create_event(
    db: &Database,
    user_id: &str,
    input: NewEvent,
    image_url: Option<String>,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<Event> {
    let event = Event {
        id: new_id(),
        created_by: user_id.to_string(),
        event_name: input.event_name,
        host_organization: input.host_organization,
        start_time: input.start_time,
        end_time: input.end_time,
        location: input.location,
        description: input.description,
        image_url,
        created_at: now,
        deleted_at: None,
    };

    let write_txn = db.begin_write()?;
    {
        charge_post(&write_txn, user_id, now, limits)?;
        let mut events = write_txn.open_table(tables::EVENTS)?;
        store(&mut events, &event.id, &event)?;
    }
    write_txn.commit()?;

    tracing::info!("User {} created event {}", user_id, event.id);
    Ok(event)
}

/// Soft delete; the creator or an administrator only
pub fn delete_event(
    db: &Database,
    event_id: &str,
    viewer: &Profile,
    now: DateTime<Utc>,
) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut events = write_txn.open_table(tables::EVENTS)?;
        let mut event: Event = load(&events, event_id)?
            .filter(|e: &Event| !e.is_deleted())
            .ok_or(AppError::NotFound("Event"))?;
        ensure_can_moderate(viewer, &event.created_by)?;

        event.deleted_at = Some(now);
        store(&mut events, event_id, &event)?;
    }
    write_txn.commit()?;

    tracing::info!("User {} deleted event {}", viewer.id, event_id);
    Ok(())
}
