use std::net::SocketAddr;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use http::{Method, header};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use patrolgate::{config::Config, handlers, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ初期化（JSON形式、環境変数でレベル制御）
    init_tracing();

    tracing::info!("patrolgate 起動中...");

    // 設定読み込み
    let config = Config::load().map_err(|e| {
        tracing::error!(error = ?e, "設定の読み込みに失敗");
        anyhow::anyhow!("Failed to load config: {}", e)
    })?;

    tracing::info!(host = %config.host, port = %config.port, "設定読み込み完了");

    // サーバーアドレスを先に構築（config が move される前に）
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            tracing::error!(error = ?e, "アドレスのパースに失敗");
            anyhow::anyhow!("Failed to parse address: {}", e)
        })?;

    // データベース接続プール作成
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "データベース接続に失敗");
            anyhow::anyhow!("Failed to connect to database: {}", e)
        })?;

    tracing::info!("データベース接続完了");

    // AppState 構築
    let state = AppState::new(db_pool, config).map_err(|e| {
        tracing::error!(error = ?e, "AppState の構築に失敗");
        anyhow::anyhow!("Failed to create AppState: {}", e)
    })?;

    // Router 構築
    let app = create_router(state);

    // サーバー起動
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(error = ?e, addr = %addr, "ポートのバインドに失敗");
        anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
    })?;

    tracing::info!(addr = %addr, "サーバー起動");

    // Graceful shutdown 対応
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "サーバーエラー");
            anyhow::anyhow!("Server error: {}", e)
        })?;

    tracing::info!("サーバー終了");

    Ok(())
}

/// tracing の初期化（JSON形式）
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,patrolgate=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Router の構築
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        // セッション
        .route("/api/oauth/redirect_url", get(handlers::oauth_redirect_url))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/logout", get(handlers::logout))
        // ユーザー
        .route("/api/users/me", get(handlers::get_me))
        .route("/api/users/me", put(handlers::update_me))
        .route("/api/users", get(handlers::list_users))
        // グループチャット
        .route("/api/messages", get(handlers::list_messages))
        .route("/api/messages", post(handlers::create_message))
        .route("/api/messages/{id}", put(handlers::update_message))
        .route("/api/messages/{id}", delete(handlers::delete_message))
        // ダイレクトメッセージ
        .route(
            "/api/direct-messages/{user_id}",
            get(handlers::list_direct_messages),
        )
        .route("/api/direct-messages", post(handlers::create_direct_message))
        .route(
            "/api/direct-messages/{user_id}/read",
            post(handlers::mark_direct_messages_read),
        )
        // 二要素認証
        .route(
            "/api/users/me/2fa/generate-secret",
            post(handlers::generate_secret),
        )
        .route("/api/users/me/2fa/enable", post(handlers::enable_2fa))
        .route("/api/users/me/2fa/disable", post(handlers::disable_2fa))
        .route("/api/users/me/2fa/verify", post(handlers::verify_2fa))
        .route(
            "/api/users/me/2fa/backup-codes",
            post(handlers::generate_backup_codes),
        )
        // 管理者
        .route(
            "/api/admin/permission-requests",
            get(handlers::list_permission_requests),
        )
        .route(
            "/api/admin/permission-requests",
            post(handlers::create_permission_request),
        )
        .route(
            "/api/admin/permission-requests/{id}/approve",
            post(handlers::approve_permission_request),
        )
        .route(
            "/api/admin/permission-requests/{id}/deny",
            post(handlers::deny_permission_request),
        )
        .route(
            "/api/admin/revoke-access/{user_id}",
            post(handlers::revoke_temporary_access),
        )
        .route("/api/admin/stats", get(handlers::admin_stats))
        .route("/api/login-history", get(handlers::login_history))
        // 通知
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/{id}/read",
            post(handlers::mark_notification_read),
        )
        .route(
            "/api/notifications/read-all",
            post(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{id}",
            delete(handlers::delete_notification),
        )
        .route("/api/notifications/send", post(handlers::send_notification))
        // プッシュ通知
        .route(
            "/api/users/me/push-subscribe",
            post(handlers::push_subscribe),
        )
        .route(
            "/api/users/me/push-unsubscribe",
            post(handlers::push_unsubscribe),
        )
        .route(
            "/api/users/me/push-settings",
            get(handlers::get_push_settings),
        )
        .route(
            "/api/users/me/push-settings",
            put(handlers::update_push_settings),
        )
        .route("/api/users/me/push-test", post(handlers::send_push_test))
        // 入力中ステータス
        .route("/api/typing-status", post(handlers::update_typing_status))
        .route(
            "/api/typing-status/{chat_type}",
            get(handlers::list_typing_users),
        )
        // NFC
        .route("/api/auth/nfc-login", post(handlers::nfc_login))
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown シグナル待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Ctrl+C ハンドラーのインストールに失敗");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "SIGTERM ハンドラーのインストールに失敗");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, starting graceful shutdown");
        }
    }
}
