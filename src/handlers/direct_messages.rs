use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::DirectMessageWithUsersRow;
use crate::state::AppState;

/// DM当事者のサマリー（レスポンス埋め込み用）
#[derive(Debug, Serialize)]
pub struct ParticipantInfo {
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DirectMessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub text: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub sender: ParticipantInfo,
    pub recipient: ParticipantInfo,
}

impl From<DirectMessageWithUsersRow> for DirectMessageResponse {
    fn from(row: DirectMessageWithUsersRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            text: row.text,
            is_read: row.is_read,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sender: ParticipantInfo {
                display_name: row.sender_display_name,
                email: row.sender_email,
                avatar_url: row.sender_avatar_url,
            },
            recipient: ParticipantInfo {
                display_name: row.recipient_display_name,
                email: row.recipient_email,
                avatar_url: row.recipient_avatar_url,
            },
        }
    }
}

/// GET /api/direct-messages/{user_id}
///
/// 相手との全DMを古い順に返す（双方向）
pub async fn list_direct_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(other_user_id): Path<Uuid>,
) -> Result<Json<Vec<DirectMessageResponse>>, AppError> {
    let messages = state
        .direct_message_repo
        .list_between(user.id, other_user_id)
        .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateDirectMessageRequest {
    pub recipient_id: Uuid,
    pub text: String,
}

/// POST /api/direct-messages
///
/// DMを送信する。受信者のプッシュ通知が有効ならアプリ内通知を作成する。
pub async fn create_direct_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateDirectMessageRequest>,
) -> Result<Json<DirectMessageResponse>, AppError> {
    validate_dm_request(&user.id, &request)?;

    let recipient = state
        .user_repo
        .find_by_id(request.recipient_id)
        .await?
        .ok_or(AppError::NotFound("宛先ユーザー"))?;

    let row = state
        .direct_message_repo
        .create(user.id, recipient.id, &request.text)
        .await?;

    // 通知作成の失敗で送信自体は失敗させない
    if recipient.push_notifications_enabled {
        let sender_name = user.display_name.as_deref().unwrap_or(&user.email);
        let body = format!("{} から新しいメッセージが届きました", sender_name);

        if let Err(e) = state
            .notification_repo
            .create(recipient.id, "新着ダイレクトメッセージ", &body, "info")
            .await
        {
            tracing::warn!(error = ?e, "DM通知の作成に失敗");
        }
    }

    tracing::info!(dm_id = %row.id, "DM送信");

    Ok(Json(row.into()))
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/direct-messages/{user_id}/read
///
/// 相手から届いた未読DMを既読にする
pub async fn mark_direct_messages_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(other_user_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .direct_message_repo
        .mark_read(other_user_id, user.id)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// DM送信リクエストのバリデーション
fn validate_dm_request(
    sender_id: &Uuid,
    request: &CreateDirectMessageRequest,
) -> Result<(), AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation(
            "メッセージ本文は必須です".to_string(),
        ));
    }

    if request.recipient_id == *sender_id {
        return Err(AppError::Validation(
            "自分宛にDMは送信できません".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_text() {
        let sender = Uuid::new_v4();
        let request = CreateDirectMessageRequest {
            recipient_id: Uuid::new_v4(),
            text: "  ".to_string(),
        };
        assert!(validate_dm_request(&sender, &request).is_err());
    }

    #[test]
    fn test_validate_self_dm() {
        let sender = Uuid::new_v4();
        let request = CreateDirectMessageRequest {
            recipient_id: sender,
            text: "こんにちは".to_string(),
        };
        assert!(validate_dm_request(&sender, &request).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let sender = Uuid::new_v4();
        let request = CreateDirectMessageRequest {
            recipient_id: Uuid::new_v4(),
            text: "本部より連絡".to_string(),
        };
        assert!(validate_dm_request(&sender, &request).is_ok());
    }
}
