pub mod feedback;
pub mod logs;
pub mod usage;
pub mod users;

pub use feedback::{FeedbackDao, FeedbackStats};
pub use logs::{LogsDao, NewLogEntry};
pub use usage::{QuotaStatus, UsageDao};
pub use users::UsersDao;
