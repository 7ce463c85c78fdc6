pub mod ai_feedback;
pub mod ai_logs;
pub mod user_ai_usage;
pub mod users;

pub use ai_feedback::Entity as AiFeedback;
pub use ai_logs::Entity as AiLogs;
pub use user_ai_usage::Entity as UserAiUsage;
pub use users::Entity as Users;

// Type aliases
pub type UserRecord = users::Model;
pub type InteractionLog = ai_logs::Model;
pub type FeedbackRecord = ai_feedback::Model;
pub type UsageRecord = user_ai_usage::Model;
pub type Rating = ai_feedback::Rating;
