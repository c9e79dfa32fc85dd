pub mod audit;
pub mod config;
pub mod executor;
pub mod flair;
pub mod janitor;
pub mod ledger;
pub mod lifecycle;
pub mod messages;
pub mod planner;
pub mod platform;
pub mod statement;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

pub use config::{Config, ConfigError, EmptyLocationPolicy, Rules};
pub use janitor::{Janitor, JanitorDeps};
pub use types::{AuditEvent, AuditKind, Comment, MediaKind, PostSnapshot, SweepStats};
