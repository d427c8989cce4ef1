use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};

use crate::auth::{SESSION_COOKIE_NAME, resolve_account, session_token_from_headers};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RedirectUrlResponse {
    pub redirect_url: String,
}

/// GET /api/oauth/redirect_url
///
/// アイデンティティサービスからOAuthログインURLを取得する
pub async fn oauth_redirect_url(
    State(state): State<AppState>,
) -> Result<Json<RedirectUrlResponse>, AppError> {
    let redirect_url = state.identity_client.oauth_redirect_url().await?;

    Ok(Json(RedirectUrlResponse { redirect_url }))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
}

/// POST /api/sessions
///
/// 認可コードをセッショントークンに交換し、HttpOnly Cookieとして設定する。
/// アカウント解決（初回は作成）とログイン履歴の記録もここで行う。
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.code.trim().is_empty() {
        return Err(AppError::Validation("認可コードは必須です".to_string()));
    }

    let session_token = state.identity_client.exchange_code(&request.code).await?;

    // アカウント解決（初回アクセスなら作成）とログイン履歴の記録
    let user = resolve_account(&state, &session_token).await?;
    state.login_history_repo.record(user.id).await?;

    tracing::info!(user_id = %user.id, "セッション発行");

    let cookie = session_cookie(&session_token, state.config.session_ttl_secs);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(SessionResponse { success: true }),
    ))
}

/// GET /api/logout
///
/// アイデンティティサービス側のセッションを破棄し、Cookieを失効させる
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token_from_headers(&headers) {
        state.identity_client.delete_session(&token).await?;
    }

    tracing::info!("ログアウト");

    let cookie = session_cookie("", 0);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(SessionResponse { success: true }),
    ))
}

/// セッションCookie文字列を構築
fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={}",
        SESSION_COOKIE_NAME, token, max_age_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("tok-123", 3600);
        assert_eq!(
            cookie,
            "patrolgate_session=tok-123; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=3600"
        );
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let cookie = session_cookie("", 0);
        assert!(cookie.starts_with("patrolgate_session=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }
}
