use sqlx::PgPool;
use uuid::Uuid;

use crate::models::TypingStatusRow;

#[derive(Clone)]
pub struct TypingStatusRepository {
    pool: PgPool,
}

impl TypingStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 入力中ステータスをupsert
    pub async fn upsert(
        &self,
        user_id: Uuid,
        chat_type: &str,
        is_typing: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO typing_status (user_id, chat_type, is_typing, last_active_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, chat_type)
            DO UPDATE SET is_typing = $3, last_active_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(chat_type)
        .bind(is_typing)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 直近5秒以内に入力中の他ユーザーを取得
    pub async fn list_active(
        &self,
        chat_type: &str,
        exclude: Uuid,
    ) -> Result<Vec<TypingStatusRow>, sqlx::Error> {
        sqlx::query_as::<_, TypingStatusRow>(
            r#"
            SELECT ts.user_id, ts.chat_type, ts.is_typing, ts.last_active_at,
                   u.display_name, u.email
            FROM typing_status ts
            JOIN users u ON ts.user_id = u.id
            WHERE ts.chat_type = $1
              AND ts.is_typing = TRUE
              AND ts.user_id != $2
              AND ts.last_active_at > NOW() - INTERVAL '5 seconds'
            "#,
        )
        .bind(chat_type)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
    }
}
