use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{AdminPermissionRequest, AdminPermissionRequestRow};

const REQUEST_COLUMNS: &str = r#"
    id, user_id, requested_permissions, reason, status,
    approved_by, approved_at, expires_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct AdminRequestRepository {
    pool: PgPool,
}

impl AdminRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 全リクエストを新しい順に取得（申請者・承認者結合済み）
    pub async fn list_all(&self) -> Result<Vec<AdminPermissionRequestRow>, sqlx::Error> {
        sqlx::query_as::<_, AdminPermissionRequestRow>(
            r#"
            SELECT
                apr.id, apr.user_id, apr.requested_permissions, apr.reason, apr.status,
                apr.approved_by, apr.approved_at, apr.expires_at, apr.created_at, apr.updated_at,
                u.display_name AS user_display_name,
                u.email AS user_email,
                u.avatar_url AS user_avatar_url,
                approver.display_name AS approver_display_name,
                approver.email AS approver_email
            FROM admin_permission_requests apr
            JOIN users u ON apr.user_id = u.id
            LEFT JOIN users approver ON apr.approved_by = approver.id
            ORDER BY apr.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// ユーザーの承認待ちリクエストを検索（重複申請チェック用）
    pub async fn find_pending_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AdminPermissionRequest>, sqlx::Error> {
        sqlx::query_as::<_, AdminPermissionRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM admin_permission_requests
            WHERE user_id = $1 AND status = 'pending'
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 承認待ちのリクエストをIDで検索（承認・却下の前提チェック用）
    pub async fn find_pending_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AdminPermissionRequest>, sqlx::Error> {
        sqlx::query_as::<_, AdminPermissionRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM admin_permission_requests
            WHERE id = $1 AND status = 'pending'
            "#
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        requested_permissions: &str,
        reason: Option<&str>,
    ) -> Result<AdminPermissionRequest, sqlx::Error> {
        sqlx::query_as::<_, AdminPermissionRequest>(&format!(
            r#"
            INSERT INTO admin_permission_requests (user_id, requested_permissions, reason)
            VALUES ($1, $2, $3)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(requested_permissions)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }

    /// リクエストを承認済みにする
    pub async fn approve(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE admin_permission_requests
            SET status = 'approved', approved_by = $2, approved_at = NOW(),
                expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .bind(approver_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// リクエストを却下する
    pub async fn deny(&self, request_id: Uuid, approver_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE admin_permission_requests
            SET status = 'denied', approved_by = $2, approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .bind(approver_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 承認待ち件数（管理者ダッシュボード統計用）
    pub async fn count_pending(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM admin_permission_requests WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
