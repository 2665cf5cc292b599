pub mod activity;
pub mod comment;
pub mod dev_support;
pub mod event;
pub mod forum;
pub mod marketplace;
pub mod package;
pub mod poll;
pub mod profile;
pub mod rate_limit;
pub mod requests;
pub mod session;

pub use activity::{Badges, Tab, UserActivity};
pub use comment::{nest_comments, Comment, CommentBoard, CommentThread, CommentView};
pub use dev_support::{
    DevSupportTicket, DevSupportTicketView, Priority, TicketStatus, TicketType,
};
pub use event::{Event, EventView};
pub use forum::{ForumPost, ForumPostView};
pub use marketplace::{ItemStatus, MarketplaceBoard, MarketplaceItem, MarketplaceItemView};
pub use package::{PackageReport, PackageReportView, PackageStatus, ReportType};
pub use poll::{sort_polls, OptionTally, Poll, PollFilter, PollOption, PollView, PollVote};
pub use profile::{Access, AuthorSummary, CredentialRecord, Profile, Role};
pub use rate_limit::{PostLimits, RateLimitRecord};
pub use requests::{
    NewAccount, NewComment, NewEvent, NewMarketplaceItem, NewPackageReport, NewPoll, NewPollOption,
    NewPost, NewTicket,
};
pub use session::SessionRecord;

/// Fresh random record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
