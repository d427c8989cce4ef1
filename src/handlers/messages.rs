use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{MessageWithSenderRow, User};
use crate::state::AppState;

/// 送信者サマリー（レスポンス埋め込み用）
#[derive(Debug, Serialize)]
pub struct SenderInfo {
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub chat_type: String,
    pub text: String,
    pub sender_id: Uuid,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub sender: SenderInfo,
}

impl From<MessageWithSenderRow> for MessageResponse {
    fn from(row: MessageWithSenderRow) -> Self {
        Self {
            id: row.id,
            chat_type: row.chat_type,
            text: row.text,
            sender_id: row.sender_id,
            location_lat: row.location_lat,
            location_lng: row.location_lng,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sender: SenderInfo {
                display_name: row.sender_display_name,
                email: row.sender_email,
                avatar_url: row.sender_avatar_url,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub chat_type: String,
}

/// GET /api/messages?chat_type=...
///
/// チャンネルの全メッセージを古い順に返す
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    validate_chat_type(&query.chat_type)?;

    let messages = state
        .message_repo
        .list_by_chat_type(&query.chat_type)
        .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub chat_type: String,
    pub text: String,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub address: Option<String>,
}

/// POST /api/messages
///
/// メッセージを投稿する。インシデント報告時は位置情報付き。
/// プッシュ通知が有効な他メンバーにアプリ内通知をファンアウトする。
pub async fn create_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_chat_type(&request.chat_type)?;
    validate_message_text(&request.text)?;

    let message = state
        .message_repo
        .create(
            &request.chat_type,
            &request.text,
            user.id,
            request.location_lat,
            request.location_lng,
            request.address.as_deref(),
        )
        .await?;

    // 通知ファンアウトの失敗で投稿自体は失敗させない
    if let Err(e) = notify_push_recipients(&state, &user, &request.text).await {
        tracing::warn!(error = ?e, "メッセージ通知のファンアウトに失敗");
    }

    let row = state
        .message_repo
        .find_with_sender(message.id)
        .await?
        .ok_or(AppError::NotFound("メッセージ"))?;

    tracing::info!(message_id = %message.id, chat_type = %message.chat_type, "メッセージ投稿");

    Ok(Json(row.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub text: String,
}

/// PUT /api/messages/{id}
///
/// メッセージを編集する（送信者本人または管理者のみ）
pub async fn update_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<UpdateMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_message_text(&request.text)?;

    let message = state
        .message_repo
        .find_by_id(message_id)
        .await?
        .ok_or(AppError::NotFound("メッセージ"))?;

    if !user.has_admin_access() && message.sender_id != user.id {
        return Err(AppError::Forbidden);
    }

    state
        .message_repo
        .update_text(message_id, &request.text)
        .await?;

    let row = state
        .message_repo
        .find_with_sender(message_id)
        .await?
        .ok_or(AppError::NotFound("メッセージ"))?;

    tracing::info!(message_id = %message_id, "メッセージ編集");

    Ok(Json(row.into()))
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// DELETE /api/messages/{id}
///
/// メッセージを削除する（送信者本人または管理者のみ）
pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    let message = state
        .message_repo
        .find_by_id(message_id)
        .await?
        .ok_or(AppError::NotFound("メッセージ"))?;

    if !user.has_admin_access() && message.sender_id != user.id {
        return Err(AppError::Forbidden);
    }

    state.message_repo.delete(message_id).await?;

    tracing::info!(message_id = %message_id, "メッセージ削除");

    Ok(Json(SuccessResponse { success: true }))
}

/// プッシュ通知が有効な他メンバーへのアプリ内通知ファンアウト
async fn notify_push_recipients(
    state: &AppState,
    sender: &User,
    text: &str,
) -> Result<(), AppError> {
    let recipients = state.user_repo.list_push_recipients(sender.id).await?;

    let sender_name = sender.display_name.as_deref().unwrap_or(&sender.email);
    let body = format!("{}: {}", sender_name, truncate_preview(text, 100));

    for recipient_id in recipients {
        state
            .notification_repo
            .create(recipient_id, "新着メッセージ", &body, "info")
            .await?;
    }

    Ok(())
}

/// 通知プレビュー用にテキストを切り詰める（文字境界を壊さない）
fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// チャンネルIDのバリデーション
fn validate_chat_type(chat_type: &str) -> Result<(), AppError> {
    if chat_type != "messages" && chat_type != "messages_v2" {
        return Err(AppError::Validation(
            "無効なチャンネルです".to_string(),
        ));
    }
    Ok(())
}

/// メッセージ本文のバリデーション
fn validate_message_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "メッセージ本文は必須です".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_known_chat_types() {
        assert!(validate_chat_type("messages").is_ok());
        assert!(validate_chat_type("messages_v2").is_ok());
    }

    #[test]
    fn test_validate_unknown_chat_type() {
        assert!(validate_chat_type("messages_v3").is_err());
        assert!(validate_chat_type("").is_err());
    }

    #[test]
    fn test_validate_empty_message_text() {
        assert!(validate_message_text("").is_err());
        assert!(validate_message_text("   ").is_err());
    }

    #[test]
    fn test_validate_valid_message_text() {
        assert!(validate_message_text("異常なし、巡回継続します").is_ok());
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_preview("巡回中", 100), "巡回中");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "あ".repeat(150);
        let preview = truncate_preview(&text, 100);
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }
}
