use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NfcLoginRequest {
    pub tag_uid: String,
}

#[derive(Debug, Serialize)]
pub struct NfcLoginResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// POST /api/auth/nfc-login
///
/// NFCタグUIDに紐づくアカウントを照合する。
/// セッションの発行はアイデンティティサービスの責務のため、
/// ここではアカウントの特定のみを行う。
pub async fn nfc_login(
    State(state): State<AppState>,
    Json(request): Json<NfcLoginRequest>,
) -> Result<Json<NfcLoginResponse>, AppError> {
    if request.tag_uid.trim().is_empty() {
        return Err(AppError::Validation("NFCタグUIDは必須です".to_string()));
    }

    let user = state
        .user_repo
        .find_by_nfc_tag(&request.tag_uid)
        .await?
        .ok_or_else(|| AppError::Authentication("unknown nfc tag".to_string()))?;

    tracing::info!(user_id = %user.id, "NFCタグ照合成功");

    Ok(Json(NfcLoginResponse {
        success: true,
        user_id: user.id,
        email: user.email,
        display_name: user.display_name,
    }))
}
