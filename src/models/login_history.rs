use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// ユーザー情報を結合したログイン履歴行（管理者画面用）
/// 記録自体はセッション発行時に行われる
#[derive(Debug, FromRow, Serialize)]
pub struct LoginHistoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub logged_in_at: OffsetDateTime,
    pub display_name: Option<String>,
    pub email: String,
}
