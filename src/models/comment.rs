use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::AuthorSummary;
use crate::db::tables::{self, RecordTable};

/// Every board that carries a comment thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentBoard {
    Forum,
    Packages,
    Events,
    Polls,
    Marketplace,
    DevSupport,
}

impl CommentBoard {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentBoard::Forum => "forum",
            CommentBoard::Packages => "packages",
            CommentBoard::Events => "events",
            CommentBoard::Polls => "polls",
            CommentBoard::Marketplace => "marketplace",
            CommentBoard::DevSupport => "dev-support",
        }
    }

    pub fn comments_table(self) -> RecordTable {
        match self {
            CommentBoard::Forum => tables::FORUM_COMMENTS,
            CommentBoard::Packages => tables::PACKAGE_COMMENTS,
            CommentBoard::Events => tables::EVENT_COMMENTS,
            CommentBoard::Polls => tables::POLL_COMMENTS,
            CommentBoard::Marketplace => tables::MARKETPLACE_COMMENTS,
            CommentBoard::DevSupport => tables::DEV_SUPPORT_COMMENTS,
        }
    }

    /// Table holding the records comments are attached to
    pub fn target_table(self) -> RecordTable {
        match self {
            CommentBoard::Forum => tables::FORUM_POSTS,
            CommentBoard::Packages => tables::PACKAGE_REPORTS,
            CommentBoard::Events => tables::EVENTS,
            CommentBoard::Polls => tables::POLLS,
            CommentBoard::Marketplace => tables::MARKETPLACE_ITEMS,
            CommentBoard::DevSupport => tables::DEV_SUPPORT_TICKETS,
        }
    }

    pub fn target_name(self) -> &'static str {
        match self {
            CommentBoard::Forum => "Post",
            CommentBoard::Packages => "Package report",
            CommentBoard::Events => "Event",
            CommentBoard::Polls => "Poll",
            CommentBoard::Marketplace => "Marketplace item",
            CommentBoard::DevSupport => "Ticket",
        }
    }

    pub fn supports_replies(self) -> bool {
        !matches!(self, CommentBoard::Events | CommentBoard::DevSupport)
    }

    pub fn supports_useful_votes(self) -> bool {
        matches!(self, CommentBoard::Forum | CommentBoard::Marketplace)
    }
}

/// Comment record, keyed by "target_id:comment_id"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub target_id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub upvotes: u32,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Comment as shown to the current user
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub target_id: String,
    pub parent_id: Option<String>,
    pub user_id: String,
    pub author: AuthorSummary,
    /// Blank once deleted; the row stays so replies keep their anchor
    pub content: String,
    pub upvotes: u32,
    pub is_useful: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorSummary, is_useful: bool) -> Self {
        let deleted = comment.deleted_at.is_some();
        Self {
            id: comment.id,
            target_id: comment.target_id,
            parent_id: comment.parent_id,
            user_id: comment.user_id,
            author,
            content: if deleted { String::new() } else { comment.content },
            upvotes: comment.upvotes,
            is_useful,
            deleted,
            created_at: comment.created_at,
        }
    }
}

/// A comment with its replies, recursively
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentThread>,
}

/// Group comments under their parents.
///
/// Input order is preserved at every level. A comment whose parent is not in
/// the list is promoted to a root.
pub fn nest_comments(comments: Vec<CommentView>) -> Vec<CommentThread> {
    let ids: HashSet<String> = comments.iter().map(|c| c.id.clone()).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<CommentView>> = HashMap::new();

    for comment in comments {
        match comment.parent_id.clone() {
            Some(parent) if ids.contains(&parent) && parent != comment.id => {
                children.entry(parent).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children))
        .collect()
}

fn attach_replies(
    comment: CommentView,
    children: &mut HashMap<String, Vec<CommentView>>,
) -> CommentThread {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach_replies(reply, children))
        .collect();
    CommentThread { comment, replies }
}
