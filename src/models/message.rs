use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// グループチャットのメッセージ
///
/// 位置情報（緯度・経度・住所）はインシデント報告時のみ付与される
#[derive(Debug, FromRow, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_type: String,
    pub text: String,
    pub sender_id: Uuid,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// 送信者情報を結合したメッセージ行
#[derive(Debug, FromRow)]
pub struct MessageWithSenderRow {
    pub id: Uuid,
    pub chat_type: String,
    pub text: String,
    pub sender_id: Uuid,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub sender_display_name: Option<String>,
    pub sender_email: String,
    pub sender_avatar_url: Option<String>,
}
