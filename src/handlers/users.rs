use axum::{Json, extract::State};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{User, UserSummary};
use crate::state::AppState;

/// GET /api/users/me
///
/// 呼び出し元のアカウント情報を返す
/// （アカウント解決・作成・権限失効は CurrentUser 抽出時に行われる）
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub nfc_tag_uid: Option<String>,
    pub push_notifications_enabled: Option<bool>,
}

/// PUT /api/users/me
///
/// プロフィールを部分更新する（省略されたフィールドは変更しない）
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    validate_update_request(&request)?;

    let updated = state
        .user_repo
        .update_profile(
            user.id,
            request.display_name.as_deref(),
            request.avatar_url.as_deref(),
            request.nfc_tag_uid.as_deref(),
            request.push_notifications_enabled,
        )
        .await?;

    tracing::info!(user_id = %user.id, "プロフィール更新");

    Ok(Json(updated))
}

/// GET /api/users
///
/// 自分以外の全ユーザーのサマリーを返す（DM相手一覧用）
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.user_repo.list_others(user.id).await?;

    Ok(Json(users))
}

/// プロフィール更新リクエストのバリデーション
fn validate_update_request(request: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(name) = &request.display_name
        && name.trim().is_empty()
    {
        return Err(AppError::Validation(
            "表示名を空にすることはできません".to_string(),
        ));
    }

    if let Some(name) = &request.display_name
        && name.chars().count() > 100
    {
        return Err(AppError::Validation(
            "表示名は100文字以内で入力してください".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_name(name: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            display_name: Some(name.to_string()),
            avatar_url: None,
            nfc_tag_uid: None,
            push_notifications_enabled: None,
        }
    }

    #[test]
    fn test_validate_empty_display_name() {
        let result = validate_update_request(&request_with_name("  "));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_long_display_name() {
        let result = validate_update_request(&request_with_name(&"あ".repeat(101)));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_display_name() {
        let result = validate_update_request(&request_with_name("夜間パトロール担当"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_all_fields_absent() {
        let request = UpdateProfileRequest {
            display_name: None,
            avatar_url: None,
            nfc_tag_uid: None,
            push_notifications_enabled: None,
        };
        assert!(validate_update_request(&request).is_ok());
    }
}
