/// Maximum number of rows returned by any list query
pub const MAX_LIST_ROWS: usize = 200;

/// Maximum results for profile search (mention autocomplete)
pub const MAX_PROFILE_SEARCH_RESULTS: usize = 5;

/// Package reports older than this are hidden from the default board
pub const PACKAGE_WINDOW_DAYS: i64 = 4;

/// Polls close two weeks after creation
pub const POLL_DURATION_DAYS: i64 = 14;

/// Minimum number of options a poll must offer
pub const MIN_POLL_OPTIONS: usize = 2;

/// Marketplace items younger than this (and still available) are "new"
pub const MARKETPLACE_NEW_WINDOW_HOURS: i64 = 6;

/// Maximum decoded image upload size in bytes (5MB)
pub const MAX_IMAGE_SIZE_BYTES: usize = 5_242_880;

/// Request body cap; base64 inflates uploads by a third
pub const MAX_REQUEST_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Image extensions accepted by the storage buckets
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const MAX_TITLE_LENGTH: usize = 200;

pub const MAX_BODY_LENGTH: usize = 10_000;

pub const MAX_COMMENT_LENGTH: usize = 4_000;

pub const SECS_PER_HOUR: i64 = 3_600;

pub const SECS_PER_DAY: i64 = 86_400;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password";

pub const ERR_ACCOUNT_BLOCKED: &str = "Account blocked";

pub const ERR_VERIFICATION_PENDING: &str =
    "Verification pending - an administrator will confirm your residency shortly";

pub const ERR_READ_ONLY: &str = "Your account has read-only access";

pub const ERR_ADMIN_ONLY: &str = "Administrator access required";

pub const ERR_NOT_OWNER: &str = "Only the author or an administrator can do that";

pub const ERR_SELF_DEMOTION: &str = "Administrators cannot remove their own admin role";
