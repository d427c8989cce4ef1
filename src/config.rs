use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,

    // 外部アイデンティティサービス設定
    /// Users Service API のベースURL
    pub identity_api_url: String,
    /// Users Service API キー
    pub identity_api_key: SecretBox<String>,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // 2FA (TOTP) 設定
    /// TOTP発行者名（認証アプリに表示される）
    pub totp_issuer: String,
    /// AES-256暗号化キー（Base64エンコード、32バイト）
    pub encryption_key: SecretBox<String>,
    /// QRコードレンダリングサービスのベースURL
    #[serde(default = "default_qr_service_url")]
    pub qr_service_url: String,

    /// 初期管理者のメールアドレス（一致するアカウントは is_admin で作成される）
    #[serde(default)]
    pub bootstrap_admin_email: Option<String>,

    /// セッションCookieの有効期間（秒）
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";
// 60日（元クライアントのセッション期限に合わせる）
const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 24 * 60 * 60;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_qr_service_url() -> String {
    DEFAULT_QR_SERVICE_URL.to_string()
}

fn default_session_ttl_secs() -> i64 {
    DEFAULT_SESSION_TTL_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
