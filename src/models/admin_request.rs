use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// 一時管理者権限のリクエスト
///
/// status: "pending" → "approved" | "denied"
#[derive(Debug, FromRow, Serialize)]
pub struct AdminPermissionRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_permissions: String,
    pub reason: Option<String>,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// 申請者・承認者情報を結合したリクエスト行
#[derive(Debug, FromRow)]
pub struct AdminPermissionRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_permissions: String,
    pub reason: Option<String>,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user_display_name: Option<String>,
    pub user_email: String,
    pub user_avatar_url: Option<String>,
    pub approver_display_name: Option<String>,
    pub approver_email: Option<String>,
}
