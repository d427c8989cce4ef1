use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::User;
use crate::services::TotpService;
use crate::state::AppState;

// === 2FA Generate Secret ===

#[derive(Debug, Serialize)]
pub struct GenerateSecretResponse {
    pub secret: String,
    pub provisioning_uri: String,
    pub qr_code_url: String,
}

/// POST /api/users/me/2fa/generate-secret
///
/// 新しいシークレットと認証アプリ登録用URI・QR画像URLを返す。
/// この時点ではDBに何も保存しない（コード検証成功まで有効化しない）。
///
/// # Security
/// - シークレット平文はログ出力禁止
pub async fn generate_secret(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<GenerateSecretResponse>, AppError> {
    if user.is_2fa_enabled {
        return Err(AppError::TotpAlreadyEnabled);
    }

    let secret = TotpService::generate_secret();
    let provisioning_uri = state.totp_service.provisioning_uri(&user.email, &secret);
    let qr_code_url = state.totp_service.qr_code_url(&provisioning_uri);

    tracing::info!(user_id = %user.id, "2FA設定開始");

    Ok(Json(GenerateSecretResponse {
        secret,
        provisioning_uri,
        qr_code_url,
    }))
}

// === 2FA Enable ===

#[derive(Debug, Deserialize)]
pub struct EnableRequest {
    pub secret: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct EnableResponse {
    pub enabled: bool,
}

/// POST /api/users/me/2fa/enable
///
/// シークレットの所持をコード検証で証明してから有効化する。
/// 検証に失敗したシークレットは保存しない。
///
/// # Security
/// - コードはログ出力禁止
pub async fn enable_2fa(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<EnableRequest>,
) -> Result<Json<EnableResponse>, AppError> {
    validate_totp_code(&request.code)?;

    if user.is_2fa_enabled {
        return Err(AppError::TotpAlreadyEnabled);
    }

    if !state
        .totp_service
        .verify_code(&request.secret, &request.code)?
    {
        return Err(AppError::TotpInvalid);
    }

    // 検証済みシークレットのみ暗号化して保存
    let encrypted = state.totp_service.encrypt_secret(&request.secret)?;
    state.user_repo.enable_totp(user.id, &encrypted).await?;

    tracing::info!(user_id = %user.id, "2FA有効化完了");

    Ok(Json(EnableResponse { enabled: true }))
}

// === 2FA Disable ===

#[derive(Debug, Deserialize)]
pub struct DisableRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct DisableResponse {
    pub disabled: bool,
}

/// POST /api/users/me/2fa/disable
///
/// 2FA無効化（現在のコードの確認必須）。シークレットは破棄される。
pub async fn disable_2fa(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<DisableRequest>,
) -> Result<Json<DisableResponse>, AppError> {
    validate_totp_code(&request.code)?;

    let secret = stored_secret(&state, &user)?;

    if !state.totp_service.verify_code(&secret, &request.code)? {
        return Err(AppError::TotpInvalid);
    }

    state.user_repo.disable_totp(user.id).await?;

    tracing::info!(user_id = %user.id, "2FA無効化完了");

    Ok(Json(DisableResponse { disabled: true }))
}

// === 2FA Verify ===

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
}

/// POST /api/users/me/2fa/verify
///
/// 保存済みシークレットに対してコードを検証する（ログイン時の第二要素確認用）
pub async fn verify_2fa(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    validate_totp_code(&request.code)?;

    let secret = stored_secret(&state, &user)?;

    if !state.totp_service.verify_code(&secret, &request.code)? {
        return Err(AppError::TotpInvalid);
    }

    Ok(Json(VerifyResponse { success: true }))
}

// === Backup Codes ===

#[derive(Debug, Serialize)]
pub struct BackupCodesResponse {
    pub codes: Vec<String>,
}

/// POST /api/users/me/2fa/backup-codes
///
/// バックアップコードを生成して返す（2FA有効時のみ）
pub async fn generate_backup_codes(
    CurrentUser(user): CurrentUser,
) -> Result<Json<BackupCodesResponse>, AppError> {
    if !user.is_2fa_enabled {
        return Err(AppError::TotpNotEnabled);
    }

    Ok(Json(BackupCodesResponse {
        codes: TotpService::generate_backup_codes(),
    }))
}

// === Helper Functions ===

/// 保存済みシークレットを復号して返す（2FA未設定ならエラー）
fn stored_secret(state: &AppState, user: &User) -> Result<String, AppError> {
    if !user.is_2fa_enabled {
        return Err(AppError::TotpNotEnabled);
    }

    let encrypted = user
        .totp_secret_encrypted
        .as_deref()
        .ok_or(AppError::TotpNotEnabled)?;

    state.totp_service.decrypt_secret(encrypted)
}

/// TOTPコードバリデーション
fn validate_totp_code(code: &str) -> Result<(), AppError> {
    if code.is_empty() {
        return Err(AppError::Validation("認証コードは必須です".to_string()));
    }
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "認証コードは6桁の数字で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_code() {
        let result = validate_totp_code("");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_short_code() {
        let result = validate_totp_code("12345");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_non_digit_code() {
        let result = validate_totp_code("12345a");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_code() {
        let result = validate_totp_code("123456");
        assert!(result.is_ok());
    }
}
