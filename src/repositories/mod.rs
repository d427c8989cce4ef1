pub mod admin_request;
pub mod direct_message;
pub mod login_history;
pub mod message;
pub mod notification;
pub mod typing_status;
pub mod user;

pub use admin_request::AdminRequestRepository;
pub use direct_message::DirectMessageRepository;
pub use login_history::LoginHistoryRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use typing_status::TypingStatusRepository;
pub use user::UserRepository;
