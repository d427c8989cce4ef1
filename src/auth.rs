use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header::COOKIE, request::Parts};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// セッションCookie名
pub const SESSION_COOKIE_NAME: &str = "patrolgate_session";

/// リクエストヘッダーからセッショントークンを取り出す
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE_NAME && !value.is_empty()).then(|| value.to_string())
    })
}

/// セッショントークンからローカルアカウントを解決する
///
/// 初回アクセス時はアカウントを作成する。既存アカウントは
/// 最終アクティビティを更新し、期限切れの一時管理者権限を失効させる。
pub async fn resolve_account(state: &AppState, session_token: &str) -> Result<User, AppError> {
    let identity_user = state.identity_client.session_user(session_token).await?;

    if let Some(mut user) = state
        .user_repo
        .find_by_external_id(&identity_user.id)
        .await?
    {
        state.user_repo.touch_last_activity(user.id).await?;

        // 期限切れの一時管理者権限を失効させる
        if user.is_temporary_admin
            && let Some(expires_at) = user.admin_expires_at
            && expires_at < OffsetDateTime::now_utc()
        {
            state.user_repo.revoke_temporary_admin(user.id).await?;
            state
                .notification_repo
                .create(
                    user.id,
                    "一時管理者権限の期限切れ",
                    "一時管理者権限の有効期限が切れました。",
                    "info",
                )
                .await?;

            tracing::info!(user_id = %user.id, "期限切れの一時管理者権限を失効");

            user.is_temporary_admin = false;
            user.admin_expires_at = None;
        }

        return Ok(user);
    }

    // 初回アクセス: アカウントを作成
    let display_name = identity_user
        .name
        .clone()
        .unwrap_or_else(|| {
            identity_user
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    let is_admin = state
        .config
        .bootstrap_admin_email
        .as_deref()
        .is_some_and(|admin| admin.eq_ignore_ascii_case(&identity_user.email));

    let user = state
        .user_repo
        .create(
            &identity_user.id,
            &identity_user.email,
            Some(&display_name),
            identity_user.picture.as_deref(),
            is_admin,
        )
        .await?;

    tracing::info!(user_id = %user.id, is_admin = is_admin, "アカウント作成");

    Ok(user)
}

/// 認証済みリクエストの呼び出し元アカウント
///
/// セッションCookie → アイデンティティサービス検証 → ローカルアカウント解決。
/// Cookieなし・無効セッションは 401 になる。
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Authentication("missing session cookie".to_string()))?;

        let user = resolve_account(state, &token).await?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_session_token() {
        let headers = headers_with_cookie("patrolgate_session=abc123");
        assert_eq!(
            session_token_from_headers(&headers),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_extracts_token_among_other_cookies() {
        let headers =
            headers_with_cookie("theme=dark; patrolgate_session=tok-42; lang=ja");
        assert_eq!(
            session_token_from_headers(&headers),
            Some("tok-42".to_string())
        );
    }

    #[test]
    fn test_missing_cookie_header() {
        let headers = HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers), None);
    }

    #[test]
    fn test_empty_token_value() {
        let headers = headers_with_cookie("patrolgate_session=");
        assert_eq!(session_token_from_headers(&headers), None);
    }

    #[test]
    fn test_other_cookie_name_is_ignored() {
        let headers = headers_with_cookie("other_session=abc");
        assert_eq!(session_token_from_headers(&headers), None);
    }
}
