use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// アイデンティティサービス側のユーザー情報
#[derive(Debug, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// OAuthリダイレクトURLレスポンス
#[derive(Debug, Deserialize)]
pub struct RedirectUrlResponse {
    pub redirect_url: String,
}

/// セッション発行リクエスト（patrolgate → Identity API）
#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    code: &'a str,
}

/// セッション発行レスポンス
#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_token: String,
}

/// 外部アイデンティティサービス（Users Service）クライアント
///
/// 認証・セッション発行はすべて外部サービスに委譲する。
/// このクライアントはセッショントークンとユーザー情報の受け渡しのみを行う。
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl IdentityClient {
    /// 新しい IdentityClient を作成
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// OAuthプロバイダーのログインURLを取得
    pub async fn oauth_redirect_url(&self) -> Result<String, AppError> {
        let url = format!("{}/oauth/google/redirect_url", self.api_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", self.api_key.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "Identity redirect_url 取得失敗");
            return Err(AppError::Internal(anyhow::anyhow!(
                "identity service returned status: {}",
                status
            )));
        }

        let body: RedirectUrlResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Identity レスポンスのパースエラー");
            AppError::Internal(anyhow::anyhow!("failed to parse identity response"))
        })?;

        Ok(body.redirect_url)
    }

    /// 認可コードをセッショントークンに交換
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let url = format!("{}/sessions", self.api_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.as_str())
            .json(&CreateSessionRequest { code })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "セッショントークン交換失敗");
            return Err(AppError::Authentication(
                "code exchange failed".to_string(),
            ));
        }

        let body: CreateSessionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Identity レスポンスのパースエラー");
            AppError::Internal(anyhow::anyhow!("failed to parse identity response"))
        })?;

        tracing::info!("セッショントークン交換成功");
        Ok(body.session_token)
    }

    /// セッショントークンからユーザー情報を取得
    ///
    /// 無効・期限切れトークンは認証エラーとして扱う
    pub async fn session_user(&self, session_token: &str) -> Result<IdentityUser, AppError> {
        let url = format!("{}/users/me", self.api_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", self.api_key.as_str())
            .bearer_auth(session_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::debug!(status = %status, "セッション検証失敗");
            return Err(AppError::Authentication("invalid session".to_string()));
        }

        let user: IdentityUser = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Identity レスポンスのパースエラー");
            AppError::Internal(anyhow::anyhow!("failed to parse identity response"))
        })?;

        Ok(user)
    }

    /// セッションを破棄（ログアウト）
    pub async fn delete_session(&self, session_token: &str) -> Result<(), AppError> {
        let url = format!("{}/sessions/current", self.api_url);

        let response = self
            .client
            .delete(&url)
            .header("x-api-key", self.api_key.as_str())
            .bearer_auth(session_token)
            .send()
            .await?;

        if !response.status().is_success() {
            // ログアウトは失敗してもCookie破棄で実害がないため警告に留める
            tracing::warn!(status = %response.status(), "セッション破棄失敗");
        }

        Ok(())
    }
}
