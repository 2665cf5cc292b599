use redb::TableDefinition;

/// Every table maps a string key to a bincode-encoded record
pub type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Profiles: user_id -> Profile
pub const PROFILES: RecordTable = TableDefinition::new("profiles");

/// Credentials: lowercase email -> CredentialRecord
pub const CREDENTIALS: RecordTable = TableDefinition::new("credentials");

/// Sessions: session_id -> SessionRecord
pub const SESSIONS: RecordTable = TableDefinition::new("sessions");

/// User activity: user_id -> UserActivity (last-seen timestamps per tab)
pub const USER_ACTIVITY: RecordTable = TableDefinition::new("user_activity");

/// Rate limits: user_id -> RateLimitRecord
pub const RATE_LIMITS: RecordTable = TableDefinition::new("rate_limits");

pub const FORUM_POSTS: RecordTable = TableDefinition::new("forum_posts");

/// "post_id:user_id" -> vote marker
pub const FORUM_POST_VOTES: RecordTable = TableDefinition::new("forum_post_votes");

pub const PACKAGE_REPORTS: RecordTable = TableDefinition::new("package_reports");

pub const EVENTS: RecordTable = TableDefinition::new("events");

pub const POLLS: RecordTable = TableDefinition::new("polls");

/// "poll_id:option_id" -> PollOption
pub const POLL_OPTIONS: RecordTable = TableDefinition::new("poll_options");

/// "poll_id:user_id" -> PollVote; the key makes one vote per user per poll
pub const POLL_VOTES: RecordTable = TableDefinition::new("poll_votes");

pub const MARKETPLACE_ITEMS: RecordTable = TableDefinition::new("marketplace_items");

/// "item_id:user_id" -> like marker
pub const MARKETPLACE_LIKES: RecordTable = TableDefinition::new("marketplace_likes");

pub const DEV_SUPPORT_TICKETS: RecordTable = TableDefinition::new("dev_support_tickets");

/// "ticket_id:user_id" -> vote marker
pub const DEV_SUPPORT_VOTES: RecordTable = TableDefinition::new("dev_support_votes");

// Comment tables: "target_id:comment_id" -> Comment
pub const FORUM_COMMENTS: RecordTable = TableDefinition::new("forum_comments");
pub const PACKAGE_COMMENTS: RecordTable = TableDefinition::new("package_comments");
pub const EVENT_COMMENTS: RecordTable = TableDefinition::new("event_comments");
pub const POLL_COMMENTS: RecordTable = TableDefinition::new("poll_comments");
pub const MARKETPLACE_COMMENTS: RecordTable = TableDefinition::new("marketplace_comments");
pub const DEV_SUPPORT_COMMENTS: RecordTable = TableDefinition::new("dev_support_comments");

/// "board:comment_id:user_id" -> vote marker
pub const COMMENT_VOTES: RecordTable = TableDefinition::new("comment_votes");

/// All tables, created on first open
pub const ALL_TABLES: &[RecordTable] = &[
    PROFILES,
    CREDENTIALS,
    SESSIONS,
    USER_ACTIVITY,
    RATE_LIMITS,
    FORUM_POSTS,
    FORUM_POST_VOTES,
    PACKAGE_REPORTS,
    EVENTS,
    POLLS,
    POLL_OPTIONS,
    POLL_VOTES,
    MARKETPLACE_ITEMS,
    MARKETPLACE_LIKES,
    DEV_SUPPORT_TICKETS,
    DEV_SUPPORT_VOTES,
    FORUM_COMMENTS,
    PACKAGE_COMMENTS,
    EVENT_COMMENTS,
    POLL_COMMENTS,
    MARKETPLACE_COMMENTS,
    DEV_SUPPORT_COMMENTS,
    COMMENT_VOTES,
];

/// Composite key for per-user rows under a parent record
pub fn pair_key(parent: &str, child: &str) -> String {
    format!("{}:{}", parent, child)
}

/// Range prefix matching every composite key under `parent`
pub fn prefix_of(parent: &str) -> String {
    format!("{}:", parent)
}
