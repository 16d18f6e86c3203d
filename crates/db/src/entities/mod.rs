//! Database entities.

pub mod activity;
pub mod user;
pub mod vote;
pub mod vote_option;

pub use activity::Entity as Activity;
pub use user::{Entity as User, Role};
pub use vote::Entity as Vote;
pub use vote_option::Entity as VoteOption;
