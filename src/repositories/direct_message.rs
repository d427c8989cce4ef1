use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DirectMessageWithUsersRow;

const JOINED_COLUMNS: &str = r#"
    dm.id, dm.sender_id, dm.recipient_id, dm.text, dm.is_read,
    dm.created_at, dm.updated_at,
    sender.display_name AS sender_display_name,
    sender.email AS sender_email,
    sender.avatar_url AS sender_avatar_url,
    recipient.display_name AS recipient_display_name,
    recipient.email AS recipient_email,
    recipient.avatar_url AS recipient_avatar_url
"#;

#[derive(Clone)]
pub struct DirectMessageRepository {
    pool: PgPool,
}

impl DirectMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 2ユーザー間の全DMを古い順に取得（双方向）
    pub async fn list_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Vec<DirectMessageWithUsersRow>, sqlx::Error> {
        sqlx::query_as::<_, DirectMessageWithUsersRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM direct_messages dm
            JOIN users sender ON dm.sender_id = sender.id
            JOIN users recipient ON dm.recipient_id = recipient.id
            WHERE (dm.sender_id = $1 AND dm.recipient_id = $2)
               OR (dm.sender_id = $2 AND dm.recipient_id = $1)
            ORDER BY dm.created_at ASC
            "#
        ))
        .bind(user_a)
        .bind(user_b)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        text: &str,
    ) -> Result<DirectMessageWithUsersRow, sqlx::Error> {
        let (message_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO direct_messages (sender_id, recipient_id, text)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query_as::<_, DirectMessageWithUsersRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM direct_messages dm
            JOIN users sender ON dm.sender_id = sender.id
            JOIN users recipient ON dm.recipient_id = recipient.id
            WHERE dm.id = $1
            "#
        ))
        .bind(message_id)
        .fetch_one(&self.pool)
        .await
    }

    /// 相手からの未読DMを既読にする
    pub async fn mark_read(&self, sender_id: Uuid, recipient_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE direct_messages
            SET is_read = TRUE, updated_at = NOW()
            WHERE sender_id = $1 AND recipient_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
