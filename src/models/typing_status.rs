use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// ユーザー情報を結合した入力中ステータス行
#[derive(Debug, FromRow, Serialize)]
pub struct TypingStatusRow {
    pub user_id: Uuid,
    pub chat_type: String,
    pub is_typing: bool,
    pub last_active_at: OffsetDateTime,
    pub display_name: Option<String>,
    pub email: String,
}
