use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("認証エラー: {0}")]
    Authentication(String),

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("Identity API エラー")]
    Identity(#[from] reqwest::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("認証コードが無効です")]
    TotpInvalid,

    #[error("二要素認証は既に有効です")]
    TotpAlreadyEnabled,

    #[error("二要素認証が有効化されていません")]
    TotpNotEnabled,

    #[error("管理者権限が必要です")]
    AdminRequired,

    #[error("この操作を行う権限がありません")]
    Forbidden,

    #[error("{0}が見つかりません")]
    NotFound(&'static str),

    #[error("承認待ちの権限リクエストが既に存在します")]
    PendingRequestExists,

    #[error("プッシュ通知が有効化されていません")]
    PushNotEnabled,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "認証されていません".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Identity(e) => {
                tracing::error!(error = ?e, "Identity API 通信エラー");
                (
                    StatusCode::BAD_GATEWAY,
                    "認証サーバーとの通信に失敗しました".to_string(),
                )
            }
            Self::TotpInvalid => (
                StatusCode::BAD_REQUEST,
                "認証コードが正しくありません。もう一度お試しください。".to_string(),
            ),
            Self::TotpAlreadyEnabled => {
                (StatusCode::CONFLICT, "二要素認証は既に有効です".to_string())
            }
            Self::TotpNotEnabled => (
                StatusCode::BAD_REQUEST,
                "二要素認証が有効化されていません".to_string(),
            ),
            Self::AdminRequired => (
                StatusCode::FORBIDDEN,
                "管理者権限が必要です".to_string(),
            ),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "この操作を行う権限がありません".to_string(),
            ),
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                format!("{}が見つかりません", what),
            ),
            Self::PendingRequestExists => (
                StatusCode::BAD_REQUEST,
                "承認待ちの権限リクエストが既に存在します".to_string(),
            ),
            Self::PushNotEnabled => (
                StatusCode::BAD_REQUEST,
                "プッシュ通知が有効化されていません".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
