use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{User, UserSummary};

const USER_COLUMNS: &str = r#"
    id, external_user_id, email, display_name, avatar_url,
    is_admin, is_temporary_admin, admin_expires_at,
    nfc_tag_uid, totp_secret_encrypted, is_2fa_enabled,
    push_subscription, push_notifications_enabled,
    last_activity_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 外部アイデンティティサービスのユーザーIDで検索
    pub async fn find_by_external_id(
        &self,
        external_user_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_user_id = $1"
        ))
        .bind(external_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// NFCタグUIDで検索（NFCログイン補助用）
    pub async fn find_by_nfc_tag(&self, tag_uid: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nfc_tag_uid = $1"
        ))
        .bind(tag_uid)
        .fetch_optional(&self.pool)
        .await
    }

    /// 新しいアカウントを作成
    ///
    /// # Note
    /// is_admin は初期管理者メールアドレスとの一致判定結果を渡す
    pub async fn create(
        &self,
        external_user_id: &str,
        email: &str,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
        is_admin: bool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (external_user_id, email, display_name, avatar_url, is_admin, last_activity_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(external_user_id)
        .bind(email)
        .bind(display_name)
        .bind(avatar_url)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await
    }

    /// 最終アクティビティ時刻を更新
    pub async fn touch_last_activity(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_activity_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// プロフィールを部分更新（NULL のフィールドは変更しない）
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
        nfc_tag_uid: Option<&str>,
        push_notifications_enabled: Option<bool>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                avatar_url = COALESCE($3, avatar_url),
                nfc_tag_uid = COALESCE($4, nfc_tag_uid),
                push_notifications_enabled = COALESCE($5, push_notifications_enabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(display_name)
        .bind(avatar_url)
        .bind(nfc_tag_uid)
        .bind(push_notifications_enabled)
        .fetch_one(&self.pool)
        .await
    }

    /// 自分以外の全ユーザーのサマリーを取得（DM相手一覧用）
    pub async fn list_others(&self, user_id: Uuid) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, email, display_name, avatar_url, is_admin, is_temporary_admin
            FROM users
            WHERE id != $1
            ORDER BY display_name, email
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    // === 一時管理者権限 ===

    /// 一時管理者権限を付与
    pub async fn grant_temporary_admin(
        &self,
        user_id: Uuid,
        expires_at: time::OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_temporary_admin = TRUE, admin_expires_at = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 一時管理者権限を取り消し（期限切れ・手動取り消し共通）
    pub async fn revoke_temporary_admin(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_temporary_admin = FALSE, admin_expires_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === 2FA (TOTP) ===

    /// 検証済みシークレットを保存して2FAを有効化
    ///
    /// # Note
    /// 検証前のシークレットは決して保存しないこと（呼び出し側の責任）
    pub async fn enable_totp(
        &self,
        user_id: Uuid,
        secret_encrypted: &[u8],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET totp_secret_encrypted = $2, is_2fa_enabled = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(secret_encrypted)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// シークレットを破棄して2FAを無効化
    pub async fn disable_totp(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET totp_secret_encrypted = NULL, is_2fa_enabled = FALSE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === プッシュ通知 ===

    /// Web Push サブスクリプションを保存して有効化
    pub async fn save_push_subscription(
        &self,
        user_id: Uuid,
        subscription_json: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET push_subscription = $2, push_notifications_enabled = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(subscription_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// サブスクリプションを破棄して無効化
    pub async fn clear_push_subscription(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET push_subscription = NULL, push_notifications_enabled = FALSE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// プッシュ通知の有効/無効のみ切り替え
    pub async fn set_push_enabled(&self, user_id: Uuid, enabled: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET push_notifications_enabled = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// プッシュ通知が有効な他ユーザーのID一覧（メッセージ通知ファンアウト用）
    pub async fn list_push_recipients(&self, exclude: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM users
            WHERE push_notifications_enabled = TRUE
              AND push_subscription IS NOT NULL
              AND id != $1
            "#,
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// 全常任管理者のID一覧（権限リクエスト通知用）
    pub async fn list_admin_ids(&self) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE is_admin = TRUE")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    // === 管理者ダッシュボード統計 ===

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_active_admins(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE is_admin = TRUE OR is_temporary_admin = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
