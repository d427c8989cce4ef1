use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{
    AdminRequestRepository, DirectMessageRepository, LoginHistoryRepository, MessageRepository,
    NotificationRepository, TypingStatusRepository, UserRepository,
};
use crate::services::{IdentityClient, TotpService};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 外部アイデンティティサービスクライアント
    pub identity_client: IdentityClient,
    /// TOTPサービス
    pub totp_service: TotpService,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// グループチャットリポジトリ
    pub message_repo: MessageRepository,
    /// DMリポジトリ
    pub direct_message_repo: DirectMessageRepository,
    /// 通知リポジトリ
    pub notification_repo: NotificationRepository,
    /// 権限リクエストリポジトリ
    pub admin_request_repo: AdminRequestRepository,
    /// ログイン履歴リポジトリ
    pub login_history_repo: LoginHistoryRepository,
    /// 入力中ステータスリポジトリ
    pub typing_status_repo: TypingStatusRepository,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let identity_client = IdentityClient::new(
            config.identity_api_url.clone(),
            config.identity_api_key.expose_secret().clone(),
        );

        let totp_service = TotpService::new(
            config.totp_issuer.clone(),
            config.qr_service_url.clone(),
            config.encryption_key.expose_secret(),
        )?;

        Ok(Self {
            db_pool: db_pool.clone(),
            config,
            identity_client,
            totp_service,
            user_repo: UserRepository::new(db_pool.clone()),
            message_repo: MessageRepository::new(db_pool.clone()),
            direct_message_repo: DirectMessageRepository::new(db_pool.clone()),
            notification_repo: NotificationRepository::new(db_pool.clone()),
            admin_request_repo: AdminRequestRepository::new(db_pool.clone()),
            login_history_repo: LoginHistoryRepository::new(db_pool.clone()),
            typing_status_repo: TypingStatusRepository::new(db_pool),
        })
    }
}
