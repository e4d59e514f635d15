pub mod access_log;
pub mod user;

pub use access_log::AccessLog;
pub use user::{User, hash_pin};
