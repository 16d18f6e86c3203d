//! Repositories wrapping sea-orm queries per aggregate.

mod activity;
mod user;
mod vote;

pub use activity::{ActivityOrder, ActivityRepository};
pub use user::UserRepository;
pub use vote::{ChoiceCount, VoteOptionRepository, VoteRepository};
