use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LoginHistoryRow;

#[derive(Clone)]
pub struct LoginHistoryRepository {
    pool: PgPool,
}

impl LoginHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// セッション発行時に履歴を記録
    pub async fn record(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO login_history (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 最新100件を取得（管理者画面用、ユーザー結合済み）
    pub async fn list_recent(&self) -> Result<Vec<LoginHistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, LoginHistoryRow>(
            r#"
            SELECT lh.id, lh.user_id, lh.logged_in_at, u.display_name, u.email
            FROM login_history lh
            JOIN users u ON lh.user_id = u.id
            ORDER BY lh.logged_in_at DESC
            LIMIT 100
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
