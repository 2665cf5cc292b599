use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuthorSummary;

/// Discussion post, keyed by post id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: String,
    pub user_id: String,
    pub post_name: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub upvotes: u32,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ForumPost {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Post as listed for the current user
#[derive(Debug, Clone, Serialize)]
pub struct ForumPostView {
    #[serde(flatten)]
    pub post: ForumPost,
    pub author: AuthorSummary,
    pub reply_count: usize,
    pub is_useful: bool,
}
