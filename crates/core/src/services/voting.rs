//! Voting service: option list, ballots and the live tally.

use alumni_common::{AppError, AppResult, IdGenerator};
use alumni_db::{
    entities::{vote, vote_option},
    repositories::{ChoiceCount, VoteOptionRepository, VoteRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tracing::info;

/// Longest accepted option label, in characters.
pub const MAX_LABEL_LEN: usize = 100;

/// Votes gathered by one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceTally {
    pub label: String,
    pub votes: u64,
    /// Share of all votes, rounded to one decimal place.
    pub percentage: f64,
}

/// Snapshot of the election.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResults {
    pub total_votes: u64,
    pub results: Vec<ChoiceTally>,
}

/// Combine the option list with per-label counts.
///
/// Every option is listed in the given order, unvoted ones with zero votes.
/// Labels that still hold votes after their option was removed follow.
#[must_use]
pub fn tally(options: &[vote_option::Model], counts: &[ChoiceCount]) -> VoteResults {
    let total_votes: u64 = counts.iter().map(|c| c.votes.max(0) as u64).sum();

    let count_of = |label: &str| {
        counts
            .iter()
            .find(|c| c.choice == label)
            .map_or(0, |c| c.votes.max(0) as u64)
    };

    let mut results: Vec<ChoiceTally> = options
        .iter()
        .map(|option| {
            let votes = count_of(&option.label);
            ChoiceTally {
                label: option.label.clone(),
                votes,
                percentage: percentage(votes, total_votes),
            }
        })
        .collect();

    for orphan in counts
        .iter()
        .filter(|c| !options.iter().any(|o| o.label == c.choice))
    {
        let votes = orphan.votes.max(0) as u64;
        results.push(ChoiceTally {
            label: orphan.choice.clone(),
            votes,
            percentage: percentage(votes, total_votes),
        });
    }

    VoteResults {
        total_votes,
        results,
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Voting service for business logic.
#[derive(Clone)]
pub struct VotingService {
    option_repo: VoteOptionRepository,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub const fn new(option_repo: VoteOptionRepository, vote_repo: VoteRepository) -> Self {
        Self {
            option_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record the member's single vote.
    pub async fn cast_vote(&self, user_id: &str, choice: &str) -> AppResult<vote::Model> {
        let choice = choice.trim();

        if self.vote_repo.find_by_user(user_id).await?.is_some() {
            return Err(AppError::AlreadyVoted);
        }

        if self.option_repo.find_by_label(choice).await?.is_none() {
            return Err(AppError::NotFound(format!("Vote option not found: {choice}")));
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            choice: Set(choice.to_string()),
            created_at: Set(Utc::now().into()),
        };

        // A concurrent second submit is caught by the unique index
        let vote = self.vote_repo.create(model).await?;
        info!(user_id = %user_id, choice = %choice, "Vote cast");
        Ok(vote)
    }

    /// Current tally, re-aggregated from the vote table.
    pub async fn results(&self) -> AppResult<VoteResults> {
        let options = self.option_repo.find_all().await?;
        let counts = self.vote_repo.count_by_choice().await?;
        Ok(tally(&options, &counts))
    }

    /// Label the member voted for, if any.
    pub async fn my_vote(&self, user_id: &str) -> AppResult<Option<String>> {
        Ok(self
            .vote_repo
            .find_by_user(user_id)
            .await?
            .map(|vote| vote.choice))
    }

    /// Configured options, by label.
    pub async fn choices(&self) -> AppResult<Vec<vote_option::Model>> {
        self.option_repo.find_all().await
    }

    /// Add an option.
    pub async fn add_choice(&self, label: &str) -> AppResult<vote_option::Model> {
        let label = label.trim();

        if label.is_empty() {
            return Err(AppError::Validation("Label must not be empty".to_string()));
        }
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(AppError::Validation(format!(
                "Label must be at most {MAX_LABEL_LEN} characters"
            )));
        }
        if self.option_repo.find_by_label(label).await?.is_some() {
            return Err(AppError::DuplicateLabel(label.to_string()));
        }

        let option = self
            .option_repo
            .create(vote_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                label: Set(label.to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        info!(option_id = %option.id, label = %option.label, "Vote option added");
        Ok(option)
    }

    /// Remove an option. Votes already cast for it are kept.
    pub async fn delete_choice(&self, id: &str) -> AppResult<()> {
        if !self.option_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Vote option not found: {id}")));
        }

        info!(option_id = %id, "Vote option deleted");
        Ok(())
    }
}
