use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// アプリ内通知
///
/// kind は "info" / "success" / "warning" のいずれか
#[derive(Debug, FromRow, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
