use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Web Push サブスクリプション（ブラウザのPushManagerが返す形式）
#[derive(Debug, Deserialize, Serialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub subscription: PushSubscription,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/users/me/push-subscribe
///
/// Web Push サブスクリプションを保存してプッシュ通知を有効化する
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if request.subscription.endpoint.trim().is_empty() {
        return Err(AppError::Validation(
            "サブスクリプションのエンドポイントは必須です".to_string(),
        ));
    }

    let subscription_json = serde_json::to_string(&request.subscription).map_err(|e| {
        tracing::error!(error = ?e, "サブスクリプションのシリアライズエラー");
        AppError::Internal(anyhow::anyhow!("failed to serialize subscription"))
    })?;

    state
        .user_repo
        .save_push_subscription(user.id, &subscription_json)
        .await?;

    tracing::info!(user_id = %user.id, "プッシュ通知購読開始");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/users/me/push-unsubscribe
///
/// サブスクリプションを破棄してプッシュ通知を無効化する
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SuccessResponse>, AppError> {
    state.user_repo.clear_push_subscription(user.id).await?;

    tracing::info!(user_id = %user.id, "プッシュ通知購読解除");

    Ok(Json(SuccessResponse { success: true }))
}

/// プッシュ通知設定
///
/// カテゴリ別フラグはクライアント側の設定で、サーバーは有効/無効のみ保持する
#[derive(Debug, Deserialize, Serialize)]
pub struct PushSettings {
    pub enabled: bool,
    pub messages: bool,
    pub incidents: bool,
    pub alerts: bool,
    pub direct_messages: bool,
}

/// GET /api/users/me/push-settings
pub async fn get_settings(CurrentUser(user): CurrentUser) -> Json<PushSettings> {
    Json(PushSettings {
        enabled: user.push_notifications_enabled,
        messages: true,
        incidents: true,
        alerts: true,
        direct_messages: true,
    })
}

/// PUT /api/users/me/push-settings
pub async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(settings): Json<PushSettings>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .user_repo
        .set_push_enabled(user.id, settings.enabled)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/users/me/push-test
///
/// テスト通知を作成する（プッシュ通知が有効なユーザーのみ）
pub async fn send_test(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SuccessResponse>, AppError> {
    if !user.push_notifications_enabled || user.push_subscription.is_none() {
        return Err(AppError::PushNotEnabled);
    }

    state
        .notification_repo
        .create(
            user.id,
            "テスト通知",
            "プッシュ通知は正常に動作しています。",
            "info",
        )
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}
