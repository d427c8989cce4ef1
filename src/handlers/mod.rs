pub mod admin;
pub mod direct_messages;
pub mod health;
pub mod messages;
pub mod nfc;
pub mod notifications;
pub mod push;
pub mod session;
pub mod two_factor;
pub mod typing;
pub mod users;

pub use admin::{
    admin_stats, approve_permission_request, create_permission_request, deny_permission_request,
    list_permission_requests, login_history, revoke_temporary_access,
};
pub use direct_messages::{
    create_direct_message, list_direct_messages, mark_direct_messages_read,
};
pub use health::health_check;
pub use messages::{create_message, delete_message, list_messages, update_message};
pub use nfc::nfc_login;
pub use notifications::{
    delete_notification, list_notifications, mark_all_notifications_read,
    mark_notification_read, send_notification,
};
pub use push::{
    get_settings as get_push_settings, send_test as send_push_test, subscribe as push_subscribe,
    unsubscribe as push_unsubscribe, update_settings as update_push_settings,
};
pub use session::{create_session, logout, oauth_redirect_url};
pub use two_factor::{
    disable_2fa, enable_2fa, generate_backup_codes, generate_secret, verify_2fa,
};
pub use typing::{list_typing_users, update_typing_status};
pub use users::{get_me, list_users, update_me};
