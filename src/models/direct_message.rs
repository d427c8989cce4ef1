use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// 送信者・受信者情報を結合したDM行
#[derive(Debug, FromRow)]
pub struct DirectMessageWithUsersRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub text: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub sender_display_name: Option<String>,
    pub sender_email: String,
    pub sender_avatar_url: Option<String>,
    pub recipient_display_name: Option<String>,
    pub recipient_email: String,
    pub recipient_avatar_url: Option<String>,
}
