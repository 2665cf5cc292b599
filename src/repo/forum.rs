use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};

use super::{bump, charge_post, ensure_can_moderate, flip_marker, Authors, Toggle};
use crate::constants::MAX_LIST_ROWS;
use crate::db::codec::{exists, load, load_all, load_children, store};
use crate::db::tables::{self, pair_key};
use crate::error::{AppError, Result};
use crate::models::{
    new_id, Comment, ForumPost, ForumPostView, NewPost, PostLimits, Profile,
};

/// Live posts, newest first
pub fn list_posts(db: &Database, viewer_id: &str) -> Result<Vec<ForumPostView>> {
    let read_txn = db.begin_read()?;
    let posts_table = read_txn.open_table(tables::FORUM_POSTS)?;
    let votes = read_txn.open_table(tables::FORUM_POST_VOTES)?;
    let comments = read_txn.open_table(tables::FORUM_COMMENTS)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;
    let mut authors = Authors::new(&profiles);

    let mut posts: Vec<ForumPost> = load_all::<ForumPost, _>(&posts_table)?
        .into_iter()
        .filter(|p| !p.is_deleted())
        .collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts.truncate(MAX_LIST_ROWS);

    posts
        .into_iter()
        .map(|post| view(post, viewer_id, &votes, &comments, &mut authors))
        .collect()
}

pub fn get_post(db: &Database, post_id: &str, viewer_id: &str) -> Result<ForumPostView> {
    let read_txn = db.begin_read()?;
    let posts = read_txn.open_table(tables::FORUM_POSTS)?;
    let votes = read_txn.open_table(tables::FORUM_POST_VOTES)?;
    let comments = read_txn.open_table(tables::FORUM_COMMENTS)?;
    let profiles = read_txn.open_table(tables::PROFILES)?;

    let post = load::<ForumPost, _>(&posts, post_id)?
        .filter(|p| !p.is_deleted())
        .ok_or(AppError::NotFound("Post"))?;
    let mut authors = Authors::new(&profiles);
    view(post, viewer_id, &votes, &comments, &mut authors)
}

pub fn create_post(
    db: &Database,
    user_id: &str,
    input: NewPost,
    now: DateTime<Utc>,
    limits: PostLimits,
) -> Result<ForumPost> {
    let post = ForumPost {
        id: new_id(),
        user_id: user_id.to_string(),
        post_name: input.post_name,
        content: input.content,
        category: input.category,
        tags: input.tags,
        upvotes: 0,
        created_at: now,
        deleted_at: None,
    };

    let write_txn = db.begin_write()?;
    {
        charge_post(&write_txn, user_id, now, limits)?;
        let mut posts = write_txn.open_table(tables::FORUM_POSTS)?;
        store(&mut posts, &post.id, &post)?;
    }
    write_txn.commit()?;

    tracing::info!("User {} created forum post {}", user_id, post.id);
    Ok(post)
}

/// Add or remove the user's useful-vote on a post
pub fn toggle_useful(db: &Database, post_id: &str, user_id: &str) -> Result<Toggle> {
    let write_txn = db.begin_write()?;
    let toggle = {
        let mut posts = write_txn.open_table(tables::FORUM_POSTS)?;
        let mut post: ForumPost = load(&posts, post_id)?
            .filter(|p: &ForumPost| !p.is_deleted())
            .ok_or(AppError::NotFound("Post"))?;

        let mut votes = write_txn.open_table(tables::FORUM_POST_VOTES)?;
        let active = flip_marker(&mut votes, &pair_key(post_id, user_id))?;
        post.upvotes = bump(post.upvotes, active);
        store(&mut posts, post_id, &post)?;

        Toggle {
            active,
            count: post.upvotes,
        }
    };
    write_txn.commit()?;
    Ok(toggle)
}

/// Soft delete; the author or an administrator only
pub fn delete_post(
    db: &Database,
    post_id: &str,
    viewer: &Profile,
    now: DateTime<Utc>,
) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut posts = write_txn.open_table(tables::FORUM_POSTS)?;
        let mut post: ForumPost = load(&posts, post_id)?
            .filter(|p: &ForumPost| !p.is_deleted())
            .ok_or(AppError::NotFound("Post"))?;
        ensure_can_moderate(viewer, &post.user_id)?;

        post.deleted_at = Some(now);
        store(&mut posts, post_id, &post)?;
    }
    write_txn.commit()?;

    tracing::info!("User {} deleted forum post {}", viewer.id, post_id);
    Ok(())
}

fn view<V, C, P>(
    post: ForumPost,
    viewer_id: &str,
    votes: &V,
    comments: &C,
    authors: &mut Authors<'_, P>,
) -> Result<ForumPostView>
where
    V: ReadableTable<&'static str, &'static [u8]>,
    C: ReadableTable<&'static str, &'static [u8]>,
    P: ReadableTable<&'static str, &'static [u8]>,
{
    let reply_count = load_children::<Comment, _>(comments, &post.id)?
        .iter()
        .filter(|c| c.deleted_at.is_none())
        .count();
    Ok(ForumPostView {
        author: authors.get(&post.user_id)?,
        is_useful: exists(votes, &pair_key(&post.id, viewer_id))?,
        reply_count,
        post,
    })
}
