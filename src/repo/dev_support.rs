use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};

use super::{bump, charge_post, ensure_can_moderate, flip_marker, Authors, Toggle};
use crate::constants::MAX_LIST_ROWS;
use crate::db::codec::{exists, load, load_all, store};
use crate::db::tables::{self, pair_key};
use crate::error::{AppError, Result};
use crate::models::{
    new_id, DevSupportTicket, DevSupportTicketView, NewTicket, PostLimits, Profile, TicketStatus,
};

pub fn create_ticket(
    db: &Database,
    user_id: &str,
    input: NewTicket,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<DevSupportTicket> {
    let ticket = DevSupportTicket {
        id: new_id(),
        user_id: user_id.to_string(),
        ticket_type: input.ticket_type,
        title: input.title,
        description: input.description,
        priority: input.priority,
        status: TicketStatus::Open,
        upvotes: 0,
        created_at: now,
        deleted_at: None,
    };

    let write_txn = db.begin_write()?;
    {
        charge_post(&write_txn, user_id, now, limits)?;
        let mut tickets = write_txn.open_table(tables::DEV_SUPPORT_TICKETS)?;
        store(&mut tickets, &ticket.id, &ticket)?;
    }
    write_txn.commit()?;

    tracing::info!(
        "User {} opened {:?} ticket {}",
        user_id,
        ticket.ticket_type,
        ticket.id
    );
    Ok(ticket)
}

/// Live tickets, newest first
pub fn list_tickets(db: &Database, viewer_id: &str) -> Result<Vec<DevSupportTicketView>> {
    let read_txn = db.begin_read()?;
    let tickets = read_txn.open_table(tables::DEV_SUPPORT_TICKETS)?;
    let votes = read_txn.open_table(tables::DEV_SUPPORT_VOTES)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut authors = Authors::new(&profiles);

    let mut listed: Vec<DevSupportTicket> = load_all::<DevSupportTicket, _>(&tickets)?
        .into_iter()
        .filter(|t| !t.is_deleted())
        .collect();
    listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    listed.truncate(MAX_LIST_ROWS);

    listed
        .into_iter()
        .map(|ticket| -> Result<DevSupportTicketView> {
            Ok(DevSupportTicketView {
                author: authors.get(&ticket.user_id)?,
                is_liked_by_me: exists(&votes, &pair_key(&ticket.id, viewer_id))?,
                ticket,
            })
        })
        .collect()
}

pub fn toggle_vote(db: &Database, ticket_id: &str, user_id: &str) -> Result<Toggle> {
    let write_txn = db.begin_write()?;
    let toggle = {
        let mut tickets = write_txn.open_table(tables::DEV_SUPPORT_TICKETS)?;
        let mut ticket = load_live(&tickets, ticket_id)?;

        let mut votes = write_txn.open_table(tables::DEV_SUPPORT_VOTES)?;
        let active = flip_marker(&mut votes, &pair_key(ticket_id, user_id))?;
        ticket.upvotes = bump(ticket.upvotes, active);
        store(&mut tickets, ticket_id, &ticket)?;

        Toggle {
            active,
            count: ticket.upvotes,
        }
    };
    write_txn.commit()?;
    Ok(toggle)
}

/// Move a ticket through its workflow; callers gate this to administrators
pub fn update_status(
    db: &Database,
    ticket_id: &str,
    status: TicketStatus,
) -> Result<DevSupportTicket> {
    let write_txn = db.begin_write()?;
    let ticket = {
        let mut tickets = write_txn.open_table(tables::DEV_SUPPORT_TICKETS)?;
        let mut ticket = load_live(&tickets, ticket_id)?;
        ticket.status = status;
        store(&mut tickets, ticket_id, &ticket)?;
        ticket
    };
    write_txn.commit()?;

    tracing::info!("Ticket {} moved to {:?}", ticket_id, status);
    Ok(ticket)
}

/// Soft delete; the author or an administrator only
pub fn delete_ticket(
    db: &Database,
    ticket_id: &str,
    viewer: &Profile,
    now: DateTime<Utc>,
) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut tickets = write_txn.open_table(tables::DEV_SUPPORT_TICKETS)?;
        let mut ticket = load_live(&tickets, ticket_id)?;
        ensure_can_moderate(viewer, &ticket.user_id)?;

        ticket.deleted_at = Some(now);
        store(&mut tickets, ticket_id, &ticket)?;
    }
    write_txn.commit()?;
    Ok(())
}

fn load_live<Tb>(tickets: &Tb, ticket_id: &str) -> Result<DevSupportTicket>
where
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    load::<DevSupportTicket, _>(tickets, ticket_id)?
        .filter(|t| !t.is_deleted())
        .ok_or(AppError::NotFound("Ticket"))
}
