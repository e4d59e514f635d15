pub mod access_log;
pub mod user;

pub use access_log::{AccessLogRepository, SqliteAccessLogRepository};
pub use user::{SqliteUserRepository, UserRepository};
