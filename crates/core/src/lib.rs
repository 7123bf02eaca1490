pub mod file;
pub mod keys;
pub mod timestamp;
pub mod user;

pub use file::{AnalysisReport, FileMetadata, FileStatus};
pub use timestamp::{Timestamp, TimestampError};
pub use user::{User, UsersIndex};
