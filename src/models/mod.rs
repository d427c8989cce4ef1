pub mod admin_request;
pub mod direct_message;
pub mod login_history;
pub mod message;
pub mod notification;
pub mod typing_status;
pub mod user;

pub use admin_request::{AdminPermissionRequest, AdminPermissionRequestRow};
pub use direct_message::DirectMessageWithUsersRow;
pub use login_history::LoginHistoryRow;
pub use message::{Message, MessageWithSenderRow};
pub use notification::Notification;
pub use typing_status::TypingStatusRow;
pub use user::{User, UserSummary};
