use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::AuthorSummary;

/// Poll header, keyed by poll id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub created_by: String,
    pub question: String,
    pub description: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Poll {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.closes_at > now
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Poll option, keyed by "poll_id:option_id"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub poll_id: String,
    pub option_text: String,
    pub description: Option<String>,
    /// Display order as submitted
    pub position: u32,
}

/// A user's single vote on a poll, keyed by "poll_id:user_id"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollVote {
    pub poll_id: String,
    pub option_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Which polls a listing returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollFilter {
    #[default]
    Active,
    Past,
    All,
}

/// Option with its current count and, for detail views, who voted
#[derive(Debug, Clone, Serialize)]
pub struct OptionTally {
    #[serde(flatten)]
    pub option: PollOption,
    pub vote_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voters: Option<Vec<AuthorSummary>>,
}

/// Poll with tallies for the current user
#[derive(Debug, Clone, Serialize)]
pub struct PollView {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<OptionTally>,
    pub total_votes: usize,
    pub my_vote: Option<String>,
}

impl PollView {
    /// Count `votes` per option. Votes for unknown options are ignored so the
    /// total always equals the sum of option counts.
    pub fn tally(
        poll: Poll,
        mut options: Vec<PollOption>,
        votes: &[PollVote],
        viewer_id: &str,
    ) -> Self {
        options.sort_by_key(|o| o.position);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for vote in votes {
            *counts.entry(vote.option_id.as_str()).or_default() += 1;
        }

        let options: Vec<OptionTally> = options
            .into_iter()
            .map(|option| OptionTally {
                vote_count: counts.get(option.id.as_str()).copied().unwrap_or(0),
                option,
                voters: None,
            })
            .collect();

        let total_votes = options.iter().map(|o| o.vote_count).sum();
        let my_vote = votes
            .iter()
            .find(|v| v.user_id == viewer_id)
            .map(|v| v.option_id.clone())
            .filter(|id| options.iter().any(|o| o.option.id == *id));

        Self {
            poll,
            options,
            total_votes,
            my_vote,
        }
    }

    /// Attach voter lists; `resolve` maps a user id to its public summary
    pub fn with_voters(
        mut self,
        votes: &[PollVote],
        resolve: impl Fn(&str) -> AuthorSummary,
    ) -> Self {
        for tally in &mut self.options {
            let voters = votes
                .iter()
                .filter(|v| v.option_id == tally.option.id)
                .map(|v| resolve(&v.user_id))
                .collect();
            tally.voters = Some(voters);
        }
        self
    }
}

/// Order polls for a listing.
///
/// Active and all: newest first. Past: most votes first, then most recently
/// closed.
pub fn sort_polls(polls: &mut [PollView], filter: PollFilter) {
    match filter {
        PollFilter::Active | PollFilter::All => {
            polls.sort_by(|a, b| b.poll.created_at.cmp(&a.poll.created_at))
        }
        PollFilter::Past => polls.sort_by(|a, b| {
            b.total_votes
                .cmp(&a.total_votes)
                .then(b.poll.closes_at.cmp(&a.poll.closes_at))
        }),
    }
}
