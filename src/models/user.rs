use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// パトロール隊員アカウント
///
/// TOTPシークレットは AES-256-GCM で暗号化されて保存される。
/// 平文シークレットはログ・レスポンスに出力禁止。
#[derive(Debug, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    /// 外部アイデンティティサービス側のユーザーID
    pub external_user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub is_temporary_admin: bool,
    pub admin_expires_at: Option<OffsetDateTime>,
    pub nfc_tag_uid: Option<String>,
    #[serde(skip)]
    pub totp_secret_encrypted: Option<Vec<u8>>,
    pub is_2fa_enabled: bool,
    /// Web Push サブスクリプション（JSON文字列）
    #[serde(skip)]
    pub push_subscription: Option<String>,
    pub push_notifications_enabled: bool,
    pub last_activity_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// 常任管理者または有効な一時管理者か
    pub fn has_admin_access(&self) -> bool {
        self.is_admin || self.is_temporary_admin
    }
}

/// ユーザー一覧・メッセージ結合用のサマリー
#[derive(Debug, FromRow, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub is_temporary_admin: bool,
}
