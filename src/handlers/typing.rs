use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::TypingStatusRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateTypingRequest {
    pub chat_type: String,
    pub is_typing: bool,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/typing-status
///
/// 入力中ステータスを更新する
pub async fn update_typing_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateTypingRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    validate_chat_type(&request.chat_type)?;

    state
        .typing_status_repo
        .upsert(user.id, &request.chat_type, request.is_typing)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/typing-status/{chat_type}
///
/// 直近5秒以内に入力中の他ユーザーを返す
pub async fn list_typing_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_type): Path<String>,
) -> Result<Json<Vec<TypingStatusRow>>, AppError> {
    validate_chat_type(&chat_type)?;

    let typing = state
        .typing_status_repo
        .list_active(&chat_type, user.id)
        .await?;

    Ok(Json(typing))
}

/// チャンネルIDのバリデーション
fn validate_chat_type(chat_type: &str) -> Result<(), AppError> {
    if chat_type != "messages" && chat_type != "messages_v2" {
        return Err(AppError::Validation("無効なチャンネルです".to_string()));
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
        assert!(validate_chat_type("dm").is_err());
    }
}
