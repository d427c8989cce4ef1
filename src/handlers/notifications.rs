use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::Notification;
use crate::state::AppState;

/// GET /api/notifications
///
/// 呼び出し元の最新50件の通知を返す
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.notification_repo.list_for_user(user.id).await?;

    Ok(Json(notifications))
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/notifications/{id}/read
///
/// 通知を既読にする（本人の通知のみ）
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .notification_repo
        .mark_read(notification_id, user.id)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/notifications/read-all
///
/// 呼び出し元の全未読通知を既読にする
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SuccessResponse>, AppError> {
    state.notification_repo.mark_all_read(user.id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/notifications/{id}
///
/// 通知を削除する（本人の通知のみ）
pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .notification_repo
        .delete(notification_id, user.id)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "info".to_string()
}

/// POST /api/notifications/send
///
/// 通知を作成する。宛先が自分以外の場合は管理者権限が必要。
pub async fn send_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    validate_notification_request(&request)?;

    if request.user_id != user.id && !user.has_admin_access() {
        return Err(AppError::Forbidden);
    }

    state
        .notification_repo
        .create(
            request.user_id,
            &request.title,
            &request.message,
            &request.kind,
        )
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// 通知作成リクエストのバリデーション
fn validate_notification_request(request: &SendNotificationRequest) -> Result<(), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("通知タイトルは必須です".to_string()));
    }

    if request.message.trim().is_empty() {
        return Err(AppError::Validation("通知本文は必須です".to_string()));
    }

    if !["info", "success", "warning"].contains(&request.kind.as_str()) {
        return Err(AppError::Validation(
            "通知種別は info / success / warning のいずれかです".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> SendNotificationRequest {
        SendNotificationRequest {
            user_id: Uuid::new_v4(),
            title: "巡回連絡".to_string(),
            message: "本日の巡回は21時からです".to_string(),
            kind: "info".to_string(),
        }
    }

    #[test]
    fn test_validate_valid_request() {
        assert!(validate_notification_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_empty_title() {
        let mut request = valid_request();
        request.title = " ".to_string();
        assert!(validate_notification_request(&request).is_err());
    }

    #[test]
    fn test_validate_empty_message() {
        let mut request = valid_request();
        request.message = String::new();
        assert!(validate_notification_request(&request).is_err());
    }

    #[test]
    fn test_validate_unknown_kind() {
        let mut request = valid_request();
        request.kind = "error".to_string();
        assert!(validate_notification_request(&request).is_err());
    }
}
