//! Comment threads shared by every board.

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};

use super::{bump, charge_post, ensure_can_moderate, flip_marker, Authors, Toggle};
use crate::db::codec::{exists, load, load_children, store};
use crate::db::tables::{self, pair_key};
use crate::error::{AppError, Result};
use crate::models::{
    new_id, Comment, CommentBoard, CommentView, DevSupportTicket, Event, ForumPost, NewComment,
    Poll, PostLimits, Profile,
};

/// Comments on a target, oldest first
pub fn list_comments(
    db: &Database,
    board: CommentBoard,
    target_id: &str,
    viewer_id: &str,
) -> Result<Vec<CommentView>> {
    let read_txn = db.begin_read()?;
    let targets = read_txn.open_table(board.target_table())?;
    if !target_is_live(board, &targets, target_id)? {
        return Err(AppError::NotFound(board.target_name()));
    }

    let comments_table = read_txn.open_table(board.comments_table())?;
    let votes = read_txn.open_table(tables::COMMENT_VOTES)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut authors = Authors::new(&profiles);

    let mut comments: Vec<Comment> = load_children(&comments_table, target_id)?;
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    comments
        .into_iter()
        .map(|comment| -> Result<CommentView> {
            let author = authors.get(&comment.user_id)?;
            let is_useful = board.supports_useful_votes()
                && exists(&votes, &vote_key(board, &comment.id, viewer_id))?;
            Ok(CommentView::new(comment, author, is_useful))
        })
        .collect()
}

pub fn create_comment(
    db: &Database,
    board: CommentBoard,
    target_id: &str,
    user_id: &str,
    input: NewComment,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<CommentView> {
    if input.parent_id.is_some() && !board.supports_replies() {
        return Err(AppError::invalid(format!(
            "Replies are not supported on {}",
            board.as_str()
        )));
    }

    let comment = Comment {
        id: new_id(),
        target_id: target_id.to_string(),
        user_id: user_id.to_string(),
        parent_id: input.parent_id,
        content: input.content,
        upvotes: 0,
        created_at: now,
        deleted_at: None,
    };

    let write_txn = db.begin_write()?;
    let author = {
        let targets = write_txn.open_table(board.target_table())?;
        if !target_is_live(board, &targets, target_id)? {
            return Err(AppError::NotFound(board.target_name()));
        }
        drop(targets);

        let mut comments = write_txn.open_table(board.comments_table())?;
        if let Some(parent_id) = &comment.parent_id {
            // Parent must live on the same target
            if !exists(&comments, &pair_key(target_id, parent_id))? {
                return Err(AppError::NotFound("Parent comment"));
            }
        }

        charge_post(&write_txn, user_id, now, limits)?;
        store(&mut comments, &pair_key(target_id, &comment.id), &comment)?;

        let profiles = write_txn.open_table(tables::PROFILES)?;
        let author = Authors::new(&profiles).get(user_id)?;
        author
    };
    write_txn.commit()?;

    tracing::info!(
        "User {} commented on {} {}",
        user_id,
        board.as_str(),
        target_id
    );
    Ok(CommentView::new(comment, author, false))
}

/// Add or remove the user's useful-vote on a comment
pub fn toggle_useful(
    db: &Database,
    board: CommentBoard,
    target_id: &str,
    comment_id: &str,
    user_id: &str,
) -> Result<Toggle> {
    if !board.supports_useful_votes() {
        return Err(AppError::invalid(format!(
            "Comments on {} cannot be voted on",
            board.as_str()
        )));
    }

    let key = pair_key(target_id, comment_id);
    let write_txn = db.begin_write()?;
    let toggle = {
        let mut comments = write_txn.open_table(board.comments_table())?;
        let mut comment: Comment = load(&comments, &key)?
            .filter(|c: &Comment| c.deleted_at.is_none())
            .ok_or(AppError::NotFound("Comment"))?;

        let mut votes = write_txn.open_table(tables::COMMENT_VOTES)?;
        let active = flip_marker(&mut votes, &vote_key(board, comment_id, user_id))?;
        comment.upvotes = bump(comment.upvotes, active);
        store(&mut comments, &key, &comment)?;

        Toggle {
            active,
            count: comment.upvotes,
        }
    };
    write_txn.commit()?;
    Ok(toggle)
}

/// Soft delete: the row stays so replies keep their parent
pub fn delete_comment(
    db: &Database,
    board: CommentBoard,
    target_id: &str,
    comment_id: &str,
    viewer: &Profile,
    now: DateTime<Utc>,
) -> Result<()> {
    let key = pair_key(target_id, comment_id);
    let write_txn = db.begin_write()?;
    {
        let mut comments = write_txn.open_table(board.comments_table())?;
        let mut comment: Comment = load(&comments, &key)?
            .filter(|c: &Comment| c.deleted_at.is_none())
            .ok_or(AppError::NotFound("Comment"))?;
        ensure_can_moderate(viewer, &comment.user_id)?;

        comment.deleted_at = Some(now);
        store(&mut comments, &key, &comment)?;
    }
    write_txn.commit()?;
    Ok(())
}

fn vote_key(board: CommentBoard, comment_id: &str, user_id: &str) -> String {
    pair_key(&pair_key(board.as_str(), comment_id), user_id)
}

/// Whether the record a comment attaches to exists and is not soft-deleted
fn target_is_live<Tb>(board: CommentBoard, targets: &Tb, target_id: &str) -> Result<bool>
where
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    Ok(match board {
        CommentBoard::Forum => {
            load::<ForumPost, _>(targets, target_id)?.is_some_and(|p| !p.is_deleted())
        }
        CommentBoard::Events => {
            load::<Event, _>(targets, target_id)?.is_some_and(|e| !e.is_deleted())
        }
        CommentBoard::Polls => load::<Poll, _>(targets, target_id)?.is_some_and(|p| !p.is_deleted()),
        CommentBoard::DevSupport => {
            load::<DevSupportTicket, _>(targets, target_id)?.is_some_and(|t| !t.is_deleted())
        }
        CommentBoard::Packages | CommentBoard::Marketplace => exists(targets, target_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock;
    use crate::models::{nest_comments, NewEvent, NewPost, Role};
    use crate::repo::test_support::*;
    use crate::repo::{events, forum};
    use chrono::Duration;

    fn comment(text: &str, parent: Option<&str>) -> NewComment {
        NewComment {
            content: text.to_string(),
            parent_id: parent.map(str::to_string),
        }
    }

    fn forum_post(db: &Database, user_id: &str) -> ForumPost {
        let input = NewPost {
            post_name: "Laundry room".to_string(),
            content: "Dryer 3 is broken".to_string(),
            category: "general".to_string(),
            tags: vec![],
        };
        forum::create_post(db, user_id, input, clock::now(), LIMITS).unwrap()
    }

    #[test]
    fn test_replies_nest_under_parent() {
        let (_dir, db) = temp_db();
        let user = resident(&db, "Ana", Role::Full);
        let post = forum_post(&db, &user.id);
        let board = CommentBoard::Forum;

        let root = create_comment(&db, board, &post.id, &user.id, comment("Root", None), clock::now(), LIMITS).unwrap();
        let reply = create_comment(&db, board, &post.id, &user.id, comment("Reply", Some(&root.id)), clock::now(), LIMITS).unwrap();
        create_comment(&db, board, &post.id, &user.id, comment("Second root", None), clock::now(), LIMITS).unwrap();

        let flat = list_comments(&db, board, &post.id, &user.id).unwrap();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0].content, "Root");

        let threads = nest_comments(flat);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[0].replies[0].comment.id, reply.id);

        let post_view = forum::get_post(&db, &post.id, &user.id).unwrap();
        assert_eq!(post_view.reply_count, 3);
    }

    #[test]
    fn test_parent_must_be_on_same_target() {
        let (_dir, db) = temp_db();
        let user = resident(&db, "Ana", Role::Full);
        let first = forum_post(&db, &user.id);
        let second = forum_post(&db, &user.id);
        let board = CommentBoard::Forum;

        let on_first = create_comment(&db, board, &first.id, &user.id, comment("Hi", None), clock::now(), LIMITS).unwrap();
        let result = create_comment(&db, board, &second.id, &user.id, comment("Reply", Some(&on_first.id)), clock::now(), LIMITS);
        assert!(matches!(result, Err(AppError::NotFound("Parent comment"))));
    }

    #[test]
    fn test_events_reject_replies_and_votes() {
        let (_dir, db) = temp_db();
        let user = resident(&db, "Ana", Role::Full);
        let start = clock::now() + Duration::days(1);
        let event = events::create_event(
            &db,
            &user.id,
            NewEvent {
                event_name: "Potluck".to_string(),
                host_organization: "Garden committee".to_string(),
                start_time: start,
                end_time: start + Duration::hours(2),
                location: "Courtyard".to_string(),
                description: String::new(),
            },
            None,
            clock::now(),
            LIMITS,
        )
        .unwrap();
        let board = CommentBoard::Events;

        let root = create_comment(&db, board, &event.id, &user.id, comment("Bringing pie", None), clock::now(), LIMITS).unwrap();
        let reply = create_comment(&db, board, &event.id, &user.id, comment("Nice", Some(&root.id)), clock::now(), LIMITS);
        assert!(matches!(reply, Err(AppError::InvalidInput(_))));
        assert!(toggle_useful(&db, board, &event.id, &root.id, &user.id).is_err());
    }

    #[test]
    fn test_useful_vote_toggle_and_soft_delete() {
        let (_dir, db) = temp_db();
        let author = resident(&db, "Author", Role::Full);
        let voter = resident(&db, "Voter", Role::Full);
        let stranger = resident(&db, "Stranger", Role::Full);
        let post = forum_post(&db, &author.id);
        let board = CommentBoard::Forum;

        let c = create_comment(&db, board, &post.id, &author.id, comment("Helpful tip", None), clock::now(), LIMITS).unwrap();

        assert_eq!(toggle_useful(&db, board, &post.id, &c.id, &voter.id).unwrap().count, 1);
        assert!(list_comments(&db, board, &post.id, &voter.id).unwrap()[0].is_useful);
        assert_eq!(toggle_useful(&db, board, &post.id, &c.id, &voter.id).unwrap().count, 0);

        assert!(matches!(
            delete_comment(&db, board, &post.id, &c.id, &stranger, clock::now()),
            Err(AppError::Forbidden(_))
        ));
        delete_comment(&db, board, &post.id, &c.id, &author, clock::now()).unwrap();

        let listed = list_comments(&db, board, &post.id, &voter.id).unwrap();
        assert!(listed[0].deleted);
        assert!(listed[0].content.is_empty());
    }

    #[test]
    fn test_comment_on_missing_target() {
        let (_dir, db) = temp_db();
        let user = resident(&db, "Ana", Role::Full);
        let result = create_comment(&db, CommentBoard::Polls, "nope", &user.id, comment("Hi", None), clock::now(), LIMITS);
        assert!(matches!(result, Err(AppError::NotFound("Poll"))));
    }
}
