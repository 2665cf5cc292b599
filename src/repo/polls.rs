use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};
use std::collections::HashMap;

use super::{charge_post, ensure_can_moderate, Authors};
use crate::constants::{MAX_LIST_ROWS, POLL_DURATION_DAYS};
use crate::db::codec::{exists, load, load_all, load_children, remove, store};
use crate::db::tables::{self, pair_key};
use crate::error::{AppError, Result};
use crate::models::{
    new_id, sort_polls, AuthorSummary, NewPoll, Poll, PollFilter, PollOption, PollView, PollVote,
    PostLimits, Profile,
};

/// Create a poll and its options; it closes two weeks from `now`
pub fn create_poll(
    db: &Database,
    user_id: &str,
    input: NewPoll,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<PollView> {
    let poll = Poll {
        id: new_id(),
        created_by: user_id.to_string(),
        question: input.question,
        description: input.description,
        visibility: "public".to_string(),
        created_at: now,
        closes_at: now + Duration::days(POLL_DURATION_DAYS),
        deleted_at: None,
    };
    let options: Vec<PollOption> = input
        .options
        .into_iter()
        .enumerate()
        .map(|(position, opt)| PollOption {
            id: new_id(),
            poll_id: poll.id.clone(),
            option_text: opt.option_text,
            description: opt.description,
            position: position as u32,
        })
        .collect();

    let write_txn = db.begin_write()?;
    {
        charge_post(&write_txn, user_id, now, limits)?;

        let mut polls = write_txn.open_table(tables::POLLS)?;
        store(&mut polls, &poll.id, &poll)?;

        let mut option_table = write_txn.open_table(tables::POLL_OPTIONS)?;
        for option in &options {
            store(&mut option_table, &pair_key(&poll.id, &option.id), option)?;
        }
    }
    write_txn.commit()?;

    tracing::info!(
        "User {} created poll {} with {} options",
        user_id,
        poll.id,
        options.len()
    );
    Ok(PollView::tally(poll, options, &[], user_id))
}

/// Polls for a listing, each with per-option counts and the viewer's vote
pub fn list_polls(
    db: &Database,
    viewer_id: &str,
    filter: PollFilter,
    now: DateTime<Utc>,
) -> Result<Vec<PollView>> {
    let read_txn = db.begin_read()?;
    let polls = read_txn.open_table(tables::POLLS)?;
    let options = read_txn.open_table(tables::POLL_OPTIONS)?;
    let votes = read_txn.open_table(tables::POLL_VOTES)?;

    let mut views = load_all::<Poll, _>(&polls)?
        .into_iter()
        .filter(|p| !p.is_deleted())
        .filter(|p| match filter {
            PollFilter::Active => p.is_open(now),
            PollFilter::Past => !p.is_open(now),
            PollFilter::All => true,
        })
        .map(|poll| tally(poll, &options, &votes, viewer_id))
        .collect::<Result<Vec<_>>>()?;

    sort_polls(&mut views, filter);
    views.truncate(MAX_LIST_ROWS);
    Ok(views)
}

/// A poll with voter lists on every option
pub fn get_poll(db: &Database, poll_id: &str, viewer_id: &str) -> Result<PollView> {
    let read_txn = db.begin_read()?;
    let polls = read_txn.open_table(tables::POLLS)?;
    let options = read_txn.open_table(tables::POLL_OPTIONS)?;
    let votes_table = read_txn.open_table(tables::POLL_VOTES)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;

    let poll = load_live(&polls, poll_id)?;
    let votes: Vec<PollVote> = load_children(&votes_table, poll_id)?;
    let view = PollView::tally(poll, load_children(&options, poll_id)?, &votes, viewer_id);

    // Resolve every voter up front so the closure below cannot fail
    let mut authors = Authors::new(&profiles);
    let mut voters = HashMap::new();
    for vote in &votes {
        voters.insert(vote.user_id.clone(), authors.get(&vote.user_id)?);
    }

    Ok(view.with_voters(&votes, |user_id| {
        voters
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| AuthorSummary::unknown(user_id))
    }))
}

/// Insert or move the user's single vote on an open poll
pub fn cast_vote(
    db: &Database,
    poll_id: &str,
    option_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<PollView> {
    let write_txn = db.begin_write()?;
    let view = {
        let polls = write_txn.open_table(tables::POLLS)?;
        let poll = load_live(&polls, poll_id)?;
        if !poll.is_open(now) {
            return Err(AppError::Conflict("This poll has closed".to_string()));
        }

        let options = write_txn.open_table(tables::POLL_OPTIONS)?;
        if !exists(&options, &pair_key(poll_id, option_id))? {
            return Err(AppError::NotFound("Poll option"));
        }

        let mut votes = write_txn.open_table(tables::POLL_VOTES)?;
        let vote = PollVote {
            poll_id: poll_id.to_string(),
            option_id: option_id.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
        };
        store(&mut votes, &pair_key(poll_id, user_id), &vote)?;

        tally(poll, &options, &votes, user_id)?
    };
    write_txn.commit()?;

    tracing::debug!("User {} voted on poll {}", user_id, poll_id);
    Ok(view)
}

/// Withdraw the user's vote while the poll is still open
pub fn retract_vote(
    db: &Database,
    poll_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<PollView> {
    let write_txn = db.begin_write()?;
    let view = {
        let polls = write_txn.open_table(tables::POLLS)?;
        let poll = load_live(&polls, poll_id)?;
        if !poll.is_open(now) {
            return Err(AppError::Conflict("This poll has closed".to_string()));
        }

        let mut votes = write_txn.open_table(tables::POLL_VOTES)?;
        if !remove(&mut votes, &pair_key(poll_id, user_id))? {
            return Err(AppError::NotFound("Vote"));
        }

        let options = write_txn.open_table(tables::POLL_OPTIONS)?;
        tally(poll, &options, &votes, user_id)?
    };
    write_txn.commit()?;
    Ok(view)
}

/// Soft delete; the creator or an administrator only
pub fn delete_poll(
    db: &Database,
    poll_id: &str,
    viewer: &Profile,
    now: DateTime<Utc>,
) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut polls = write_txn.open_table(tables::POLLS)?;
        let mut poll = load_live(&polls, poll_id)?;
        ensure_can_moderate(viewer, &poll.created_by)?;

        poll.deleted_at = Some(now);
        store(&mut polls, poll_id, &poll)?;
    }
    write_txn.commit()?;

    tracing::info!("User {} deleted poll {}", viewer.id, poll_id);
    Ok(())
}

fn load_live<Tb>(polls: &Tb, poll_id: &str) -> Result<Poll>
where
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    load::<Poll, _>(polls, poll_id)?
        .filter(|p| !p.is_deleted())
        .ok_or(AppError::NotFound("Poll"))
}

fn tally<O, V>(poll: Poll, options: &O, votes: &V, viewer_id: &str) -> Result<PollView>
where
    O: ReadableTable<&'static str, &'static [u8]>,
    V: ReadableTable<&'static str, &'static [u8]>,
{
    let option_rows: Vec<PollOption> = load_children(options, &poll.id)?;
    let vote_rows: Vec<PollVote> = load_children(votes, &poll.id)?;
    Ok(PollView::tally(poll, option_rows, &vote_rows, viewer_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock;
    use crate::models::{NewPollOption, Role};
    use crate::repo::test_support::*;

    fn new_poll(question: &str, options: &[&str]) -> NewPoll {
        NewPoll {
            question: question.to_string(),
            description: String::new(),
            options: options
                .iter()
                .map(|text| NewPollOption {
                    option_text: text.to_string(),
                    description: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_one_vote_changes_one_option_by_one() {
        let (_dir, db) = temp_db();
        let creator = resident(&db, "Creator", Role::Full);
        let voter = resident(&db, "Voter", Role::Full);

        let created = create_poll(
            &db,
            &creator.id,
            new_poll("Paint color?", &["Blue", "Green", "Grey"]),
            clock::now(),
            LIMITS,
        )
        .unwrap();
        assert_eq!(created.options.len(), 3);
        assert_eq!(created.total_votes, 0);

        let green = created.options[1].option.id.clone();
        let after = cast_vote(&db, &created.poll.id, &green, &voter.id, clock::now()).unwrap();

        assert_eq!(after.total_votes, 1);
        let counts: Vec<usize> = after.options.iter().map(|o| o.vote_count).collect();
        assert_eq!(counts, vec![0, 1, 0]);
        assert_eq!(after.my_vote.as_deref(), Some(green.as_str()));
    }

    #[test]
    fn test_changing_vote_moves_it() {
        let (_dir, db) = temp_db();
        let voter = resident(&db, "Voter", Role::Full);
        let poll = create_poll(&db, &voter.id, new_poll("Q", &["A", "B"]), clock::now(), LIMITS)
            .unwrap();
        let a = poll.options[0].option.id.clone();
        let b = poll.options[1].option.id.clone();

        cast_vote(&db, &poll.poll.id, &a, &voter.id, clock::now()).unwrap();
        let moved = cast_vote(&db, &poll.poll.id, &b, &voter.id, clock::now()).unwrap();
        assert_eq!(moved.total_votes, 1);
        assert_eq!(moved.options[0].vote_count, 0);
        assert_eq!(moved.options[1].vote_count, 1);

        let retracted = retract_vote(&db, &poll.poll.id, &voter.id, clock::now()).unwrap();
        assert_eq!(retracted.total_votes, 0);
        assert!(retracted.my_vote.is_none());
    }

    #[test]
    fn test_closed_poll_rejects_votes_and_lists_as_past() {
        let (_dir, db) = temp_db();
        let voter = resident(&db, "Voter", Role::Full);
        let created_at = clock::now() - Duration::days(POLL_DURATION_DAYS + 1);
        let poll =
            create_poll(&db, &voter.id, new_poll("Old", &["A", "B"]), created_at, LIMITS).unwrap();
        let option = poll.options[0].option.id.clone();

        assert!(matches!(
            cast_vote(&db, &poll.poll.id, &option, &voter.id, clock::now()),
            Err(AppError::Conflict(_))
        ));

        assert!(list_polls(&db, &voter.id, PollFilter::Active, clock::now())
            .unwrap()
            .is_empty());
        assert_eq!(
            list_polls(&db, &voter.id, PollFilter::Past, clock::now())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_vote_for_foreign_option_rejected() {
        let (_dir, db) = temp_db();
        let voter = resident(&db, "Voter", Role::Full);
        let first = create_poll(&db, &voter.id, new_poll("1", &["A", "B"]), clock::now(), LIMITS)
            .unwrap();
        let second = create_poll(&db, &voter.id, new_poll("2", &["C", "D"]), clock::now(), LIMITS)
            .unwrap();

        let foreign = second.options[0].option.id.clone();
        assert!(matches!(
            cast_vote(&db, &first.poll.id, &foreign, &voter.id, clock::now()),
            Err(AppError::NotFound("Poll option"))
        ));
    }

    #[test]
    fn test_details_include_voters() {
        let (_dir, db) = temp_db();
        let creator = resident(&db, "Creator", Role::Full);
        let voter = resident(&db, "Voter", Role::Full);
        let poll = create_poll(&db, &creator.id, new_poll("Q", &["A", "B"]), clock::now(), LIMITS)
            .unwrap();
        let a = poll.options[0].option.id.clone();
        cast_vote(&db, &poll.poll.id, &a, &voter.id, clock::now()).unwrap();

        let details = get_poll(&db, &poll.poll.id, &creator.id).unwrap();
        let voters = details.options[0].voters.as_ref().unwrap();
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].user_name, "Voter");
        assert!(details.my_vote.is_none());
    }
}
