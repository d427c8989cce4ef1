use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{AdminPermissionRequestRow, LoginHistoryRow};
use crate::state::AppState;

/// 承認時のデフォルト有効期間（時間）
const DEFAULT_GRANT_HOURS: i64 = 24;
/// 付与できる最長期間（1週間）
const MAX_GRANT_HOURS: i64 = 168;

/// 申請者サマリー（レスポンス埋め込み用）
#[derive(Debug, Serialize)]
pub struct RequesterInfo {
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// 承認者サマリー（レスポンス埋め込み用）
#[derive(Debug, Serialize)]
pub struct ApproverInfo {
    pub display_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_permissions: String,
    pub reason: Option<String>,
    pub status: String,
    pub approved_at: Option<OffsetDateTime>,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub user: RequesterInfo,
    pub approver: Option<ApproverInfo>,
}

impl From<AdminPermissionRequestRow> for PermissionRequestResponse {
    fn from(row: AdminPermissionRequestRow) -> Self {
        let approver = row.approver_email.map(|email| ApproverInfo {
            display_name: row.approver_display_name,
            email,
        });

        Self {
            id: row.id,
            user_id: row.user_id,
            requested_permissions: row.requested_permissions,
            reason: row.reason,
            status: row.status,
            approved_at: row.approved_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: RequesterInfo {
                display_name: row.user_display_name,
                email: row.user_email,
                avatar_url: row.user_avatar_url,
            },
            approver,
        }
    }
}

/// GET /api/admin/permission-requests
///
/// 全権限リクエストを新しい順に返す（管理者のみ）
pub async fn list_permission_requests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PermissionRequestResponse>>, AppError> {
    if !user.has_admin_access() {
        return Err(AppError::AdminRequired);
    }

    let requests = state.admin_request_repo.list_all().await?;

    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    pub requested_permissions: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRequestResponse {
    pub success: bool,
    pub id: Uuid,
}

/// POST /api/admin/permission-requests
///
/// 一時管理者権限を申請する。承認待ちの申請がある場合は拒否。
/// 全常任管理者に通知を送る。
pub async fn create_permission_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateRequestRequest>,
) -> Result<Json<CreateRequestResponse>, AppError> {
    if request.requested_permissions.trim().is_empty() {
        return Err(AppError::Validation(
            "申請する権限の内容は必須です".to_string(),
        ));
    }

    if state
        .admin_request_repo
        .find_pending_for_user(user.id)
        .await?
        .is_some()
    {
        return Err(AppError::PendingRequestExists);
    }

    let created = state
        .admin_request_repo
        .create(
            user.id,
            &request.requested_permissions,
            request.reason.as_deref(),
        )
        .await?;

    // 全常任管理者に通知
    let requester = user.display_name.as_deref().unwrap_or(&user.email);
    let body = format!(
        "{} が管理者権限を申請しました: {}",
        requester, request.requested_permissions
    );

    for admin_id in state.user_repo.list_admin_ids().await? {
        state
            .notification_repo
            .create(admin_id, "新しい権限リクエスト", &body, "info")
            .await?;
    }

    tracing::info!(request_id = %created.id, user_id = %user.id, "権限リクエスト作成");

    Ok(Json(CreateRequestResponse {
        success: true,
        id: created.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub duration_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/admin/permission-requests/{id}/approve
///
/// リクエストを承認し、一時管理者権限を期限付きで付与する（管理者のみ）
pub async fn approve_permission_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !user.has_admin_access() {
        return Err(AppError::AdminRequired);
    }

    let duration_hours = request.duration_hours.unwrap_or(DEFAULT_GRANT_HOURS);
    if !(1..=MAX_GRANT_HOURS).contains(&duration_hours) {
        return Err(AppError::Validation(format!(
            "有効期間は1〜{}時間で指定してください",
            MAX_GRANT_HOURS
        )));
    }

    let pending = state
        .admin_request_repo
        .find_pending_by_id(request_id)
        .await?
        .ok_or(AppError::NotFound("権限リクエスト"))?;

    let expires_at = OffsetDateTime::now_utc() + Duration::hours(duration_hours);

    state
        .admin_request_repo
        .approve(request_id, user.id, expires_at)
        .await?;
    state
        .user_repo
        .grant_temporary_admin(pending.user_id, expires_at)
        .await?;

    let body = format!(
        "申請した権限（{}）が承認されました。有効期限: {}時間後",
        pending.requested_permissions, duration_hours
    );
    state
        .notification_repo
        .create(pending.user_id, "権限リクエスト承認", &body, "success")
        .await?;

    tracing::info!(
        request_id = %request_id,
        approved_by = %user.id,
        duration_hours = duration_hours,
        "権限リクエスト承認"
    );

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/admin/permission-requests/{id}/deny
///
/// リクエストを却下する（管理者のみ）
pub async fn deny_permission_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !user.has_admin_access() {
        return Err(AppError::AdminRequired);
    }

    let pending = state
        .admin_request_repo
        .find_pending_by_id(request_id)
        .await?
        .ok_or(AppError::NotFound("権限リクエスト"))?;

    state.admin_request_repo.deny(request_id, user.id).await?;

    let body = format!(
        "申請した権限（{}）は却下されました。",
        pending.requested_permissions
    );
    state
        .notification_repo
        .create(pending.user_id, "権限リクエスト却下", &body, "warning")
        .await?;

    tracing::info!(request_id = %request_id, denied_by = %user.id, "権限リクエスト却下");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/admin/revoke-access/{user_id}
///
/// 一時管理者権限を手動で取り消す（常任管理者のみ）
pub async fn revoke_temporary_access(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(target_user_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    // 一時管理者には取り消し権限を与えない
    if !user.is_admin {
        return Err(AppError::AdminRequired);
    }

    state
        .user_repo
        .revoke_temporary_admin(target_user_id)
        .await?;

    state
        .notification_repo
        .create(
            target_user_id,
            "一時管理者権限の取り消し",
            "一時管理者権限が管理者により取り消されました。",
            "warning",
        )
        .await?;

    tracing::info!(target_user_id = %target_user_id, revoked_by = %user.id, "一時管理者権限取り消し");

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub active_admins: i64,
    pub pending_requests: i64,
    pub recent_activity: i64,
}

/// GET /api/admin/stats
///
/// 管理者ダッシュボード用の統計を返す（管理者のみ）
pub async fn admin_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AdminStatsResponse>, AppError> {
    if !user.has_admin_access() {
        return Err(AppError::AdminRequired);
    }

    let (total_users, active_admins, pending_requests, recent_activity) = tokio::try_join!(
        state.user_repo.count_all(),
        state.user_repo.count_active_admins(),
        state.admin_request_repo.count_pending(),
        state.message_repo.count_recent(),
    )?;

    Ok(Json(AdminStatsResponse {
        total_users,
        active_admins,
        pending_requests,
        recent_activity,
    }))
}

/// GET /api/login-history
///
/// 最新100件のログイン履歴を返す（管理者のみ）
pub async fn login_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<LoginHistoryRow>>, AppError> {
    if !user.has_admin_access() {
        return Err(AppError::AdminRequired);
    }

    let history = state.login_history_repo.list_recent().await?;

    Ok(Json(history))
}
