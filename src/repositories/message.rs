use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Message, MessageWithSenderRow};

const JOINED_COLUMNS: &str = r#"
    m.id, m.chat_type, m.text, m.sender_id,
    m.location_lat, m.location_lng, m.address,
    m.created_at, m.updated_at,
    u.display_name AS sender_display_name,
    u.email AS sender_email,
    u.avatar_url AS sender_avatar_url
"#;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// チャンネルの全メッセージを古い順に取得（送信者結合済み）
    pub async fn list_by_chat_type(
        &self,
        chat_type: &str,
    ) -> Result<Vec<MessageWithSenderRow>, sqlx::Error> {
        sqlx::query_as::<_, MessageWithSenderRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM messages m
            JOIN users u ON m.sender_id = u.id
            WHERE m.chat_type = $1
            ORDER BY m.created_at ASC
            "#
        ))
        .bind(chat_type)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, message_id: Uuid) -> Result<Option<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, chat_type, text, sender_id, location_lat, location_lng, address,
                   created_at, updated_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 送信者結合済みの単一メッセージを取得（作成・更新後のレスポンス用）
    pub async fn find_with_sender(
        &self,
        message_id: Uuid,
    ) -> Result<Option<MessageWithSenderRow>, sqlx::Error> {
        sqlx::query_as::<_, MessageWithSenderRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM messages m
            JOIN users u ON m.sender_id = u.id
            WHERE m.id = $1
            "#
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        chat_type: &str,
        text: &str,
        sender_id: Uuid,
        location_lat: Option<f64>,
        location_lng: Option<f64>,
        address: Option<&str>,
    ) -> Result<Message, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (chat_type, text, sender_id, location_lat, location_lng, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, chat_type, text, sender_id, location_lat, location_lng, address,
                      created_at, updated_at
            "#,
        )
        .bind(chat_type)
        .bind(text)
        .bind(sender_id)
        .bind(location_lat)
        .bind(location_lng)
        .bind(address)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_text(&self, message_id: Uuid, text: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE messages SET text = $2, updated_at = NOW() WHERE id = $1")
            .bind(message_id)
            .bind(text)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, message_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 直近24時間の投稿数（管理者ダッシュボード統計用）
    pub async fn count_recent(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE created_at > NOW() - INTERVAL '24 hours'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
