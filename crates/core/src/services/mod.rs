//! Business logic services.

#![allow(missing_docs)]

pub mod activity;
pub mod card;
pub mod policy;
pub mod session;
pub mod user;
pub mod voting;

pub use activity::{
    ActivityPage, ActivityService, ActivitySort, CreateActivityInput, ListActivitiesInput,
    PAGE_SIZE, UpdateActivityInput, parse_date,
};
pub use card::MembershipCard;
pub use policy::{Action, Decision, authorize};
pub use session::{Session, SessionService};
pub use user::{CreateUserInput, UpdateProfileInput, UpdateUserInput, UserService};
pub use voting::{ChoiceTally, VoteResults, VotingService, tally};
