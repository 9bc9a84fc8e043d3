//! Data models for the service.
//!
//! These models represent the core entities stored in SQLite and returned to
//! API clients. All models derive Serialize for responses and FromRow for
//! SQLx queries where they map to a table.

pub mod pull_request;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestStatus, REVIEWERS_MAX_COUNT};
pub use team::{Team, TeamMember};
pub use user::{User, UserStat};
