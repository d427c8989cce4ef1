use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, OsRng},
};
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore};
use sha1::Sha1;

use crate::error::AppError;

type HmacSha1 = Hmac<Sha1>;

/// Base32アルファベット（RFC 4648、パディングなし）
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// タイムステップ（秒）
const PERIOD: u64 = 30;

/// コード桁数
const CODE_DIGITS: usize = 6;

/// 許容するタイムステップのずれ（前後Nステップ）
const WINDOW: i64 = 1;

/// 生成するシークレットの文字数（32文字 = 160ビット）
const SECRET_LENGTH: usize = 32;

const BACKUP_CODE_COUNT: usize = 10;
const BACKUP_CODE_LENGTH: usize = 8;
const BACKUP_CODE_CHARSET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// バイト列をBase32文字列にエンコード（パディングなし）
pub fn encode_base32(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// Base32文字列をバイト列にデコード
///
/// 認証アプリが表示用に挿入するスペース・ハイフンは除去して受け付ける。
/// それ以外の不正文字・不正長はエラー（暗黙の切り捨てはしない）。
pub fn decode_base32(text: &str) -> Result<Vec<u8>, AppError> {
    let normalized: String = text
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    BASE32_NOPAD.decode(normalized.as_bytes()).map_err(|e| {
        tracing::error!(error = ?e, "シークレットのBase32デコードエラー");
        AppError::Internal(anyhow::anyhow!("invalid base32 secret"))
    })
}

/// 指定タイムカウンターのコードを計算（RFC 6238 / RFC 4226）
///
/// カウンターを8バイトビッグエンディアンでHMAC-SHA1し、
/// dynamic truncation で31ビット整数を取り出して下6桁にする。
/// 純粋関数: 同じ (secret, counter) は常に同じコードを返す。
fn code_at(secret_bytes: &[u8], counter: u64) -> Result<String, AppError> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(secret_bytes).map_err(|e| {
        tracing::error!(error = ?e, "HMAC-SHA1の初期化エラー");
        AppError::Internal(anyhow::anyhow!("hmac initialization error"))
    })?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // dynamic truncation (RFC 4226 §5.3)
    let offset = (digest[19] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);

    Ok(format!("{:06}", binary % 1_000_000))
}

/// TOTP (Time-based One-Time Password) サービス
///
/// # Security
/// - シークレットはAES-256-GCMで暗号化してDB保存
/// - シークレット平文・認証コードはログに出力しない
#[derive(Clone)]
pub struct TotpService {
    issuer: String,
    qr_service_url: String,
    encryption_key: [u8; 32],
}

impl TotpService {
    /// 新しい TotpService を作成
    ///
    /// # Arguments
    /// * `issuer` - TOTP発行者名（認証アプリに表示される）
    /// * `qr_service_url` - QRコードレンダリングサービスのベースURL
    /// * `encryption_key_base64` - Base64エンコードされた32バイトの暗号化キー
    pub fn new(
        issuer: String,
        qr_service_url: String,
        encryption_key_base64: &str,
    ) -> Result<Self, AppError> {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        let key_bytes = STANDARD.decode(encryption_key_base64).map_err(|e| {
            tracing::error!(error = ?e, "暗号化キーのBase64デコードエラー");
            AppError::Internal(anyhow::anyhow!("invalid encryption key format"))
        })?;

        if key_bytes.len() != 32 {
            tracing::error!(
                expected = 32,
                actual = key_bytes.len(),
                "暗号化キーの長さが不正"
            );
            return Err(AppError::Internal(anyhow::anyhow!(
                "encryption key must be 32 bytes"
            )));
        }

        let mut encryption_key = [0u8; 32];
        encryption_key.copy_from_slice(&key_bytes);

        Ok(Self {
            issuer,
            qr_service_url,
            encryption_key,
        })
    }

    /// 新しいシークレットを生成
    ///
    /// CSPRNGから32バイト取り、剰余でアルファベットに写像する。
    /// 256は32の倍数なので偏りは生じない。
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);

        bytes
            .iter()
            .map(|b| ALPHABET[(b % 32) as usize] as char)
            .collect()
    }

    /// バックアップコードを生成（保存はしない、呼び出し側に返すのみ）
    pub fn generate_backup_codes() -> Vec<String> {
        let mut rng = rand::thread_rng();

        (0..BACKUP_CODE_COUNT)
            .map(|_| {
                (0..BACKUP_CODE_LENGTH)
                    .map(|_| {
                        let idx = rng.gen_range(0..BACKUP_CODE_CHARSET.len());
                        BACKUP_CODE_CHARSET[idx] as char
                    })
                    .collect()
            })
            .collect()
    }

    /// 認証アプリ登録用のURIを構築
    ///
    /// `otpauth://totp/ISSUER:ACCOUNT?secret=...&issuer=...&algorithm=SHA1&digits=6&period=30`
    pub fn provisioning_uri(&self, account: &str, secret: &str) -> String {
        format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits={}&period={}",
            urlencoding::encode(&self.issuer),
            urlencoding::encode(account),
            secret,
            urlencoding::encode(&self.issuer),
            CODE_DIGITS,
            PERIOD,
        )
    }

    /// URIをQRコード画像URLに変換
    ///
    /// レンダリングは外部サービスに委譲する（このサービスはURI文字列のみ生成）
    pub fn qr_code_url(&self, provisioning_uri: &str) -> String {
        format!(
            "{}?size=256x256&data={}",
            self.qr_service_url,
            urlencoding::encode(provisioning_uri),
        )
    }

    /// TOTPコードを検証
    ///
    /// # Note
    /// 前後1ステップの時間ウィンドウを許容（±30秒）。
    /// 6桁の数字でない入力は（タイプミスとして）常に不一致扱い。
    pub fn verify_code(&self, secret: &str, code: &str) -> Result<bool, AppError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| {
                tracing::error!(error = ?e, "システム時刻取得エラー");
                AppError::Internal(anyhow::anyhow!("system time error"))
            })?
            .as_secs();

        Self::verify_code_at(secret, code, now)
    }

    /// 指定時刻でコードを検証（検証ロジック本体）
    fn verify_code_at(secret: &str, code: &str, unix_seconds: u64) -> Result<bool, AppError> {
        // 入力検証: コードは6桁の数字のみ
        if code.len() != CODE_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Ok(false);
        }

        let secret_bytes = decode_base32(secret)?;
        let current = (unix_seconds / PERIOD) as i64;

        for offset in -WINDOW..=WINDOW {
            let counter = current + offset;
            if counter < 0 {
                continue;
            }
            if code_at(&secret_bytes, counter as u64)? == code {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// シークレットをAES-256-GCMで暗号化
    ///
    /// # Returns
    /// 96ビットnonce (12バイト) + 暗号文
    pub fn encrypt_secret(&self, secret: &str) -> Result<Vec<u8>, AppError> {
        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key).map_err(|e| {
            tracing::error!(error = ?e, "AES-GCM暗号化器の初期化エラー");
            AppError::Internal(anyhow::anyhow!("cipher initialization error"))
        })?;

        // 96ビット (12バイト) のランダムnonce生成
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher.encrypt(nonce, secret.as_bytes()).map_err(|e| {
            tracing::error!(error = ?e, "シークレット暗号化エラー");
            AppError::Internal(anyhow::anyhow!("encryption error"))
        })?;

        let mut result = Vec::with_capacity(12 + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// 暗号化されたシークレットを復号
    pub fn decrypt_secret(&self, encrypted: &[u8]) -> Result<String, AppError> {
        if encrypted.len() < 12 {
            tracing::error!(len = encrypted.len(), "暗号化データが短すぎる");
            return Err(AppError::Internal(anyhow::anyhow!(
                "encrypted data too short"
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key).map_err(|e| {
            tracing::error!(error = ?e, "AES-GCM暗号化器の初期化エラー");
            AppError::Internal(anyhow::anyhow!("cipher initialization error"))
        })?;

        let (nonce_bytes, ciphertext) = encrypted.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher.decrypt(nonce, ciphertext).map_err(|e| {
            tracing::error!(error = ?e, "シークレット復号エラー");
            AppError::Internal(anyhow::anyhow!("decryption error"))
        })?;

        String::from_utf8(plaintext).map_err(|e| {
            tracing::error!(error = ?e, "復号データのUTF-8変換エラー");
            AppError::Internal(anyhow::anyhow!("invalid utf8 after decryption"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    /// RFC 6238 Appendix B のSHA1テストシークレット
    /// （ASCII "12345678901234567890" のBase32表現）
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn create_test_service() -> TotpService {
        let key = [0u8; 32];
        let key_base64 = STANDARD.encode(key);
        TotpService::new(
            "TestApp".to_string(),
            "https://qr.example.com/render".to_string(),
            &key_base64,
        )
        .unwrap()
    }

    #[test]
    fn test_rfc6238_sha1_vectors() {
        // RFC 6238 Appendix B の8桁コードの下6桁
        let vectors: &[(u64, &str)] = &[
            (59, "287082"),
            (1111111109, "081804"),
            (1111111111, "050471"),
            (1234567890, "005924"),
            (2000000000, "279037"),
            (20000000000, "353130"),
        ];

        let secret_bytes = decode_base32(RFC_SECRET).unwrap();
        assert_eq!(secret_bytes, b"12345678901234567890");

        for (unix_time, expected) in vectors {
            let code = code_at(&secret_bytes, unix_time / PERIOD).unwrap();
            assert_eq!(&code, expected, "unix_time = {}", unix_time);
        }
    }

    #[test]
    fn test_code_is_deterministic() {
        let secret_bytes = decode_base32(RFC_SECRET).unwrap();
        let first = code_at(&secret_bytes, 12345).unwrap();
        let second = code_at(&secret_bytes, 12345).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_base32_roundtrip() {
        let ten_bytes: Vec<u8> = (0u8..10).collect();
        let twenty_bytes: Vec<u8> = (100u8..120).collect();

        for bytes in [ten_bytes, twenty_bytes] {
            let encoded = encode_base32(&bytes);
            // 5バイトごとに8文字
            assert_eq!(encoded.len(), bytes.len() * 8 / 5);
            assert_eq!(decode_base32(&encoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_decode_accepts_formatting_characters() {
        // 認証アプリの表示形式（4文字区切り・小文字）を許容する
        let formatted = "gezd gnbv-gy3t qojq GEZD GNBV GY3T QOJQ";
        assert_eq!(
            decode_base32(formatted).unwrap(),
            decode_base32(RFC_SECRET).unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_invalid_characters() {
        // "1" はBase32アルファベット外（黙って読み飛ばさずエラーにする）
        assert!(decode_base32("GEZD1NBV").is_err());
        assert!(decode_base32("GEZD!NBV").is_err());
    }

    #[test]
    fn test_window_tolerance() {
        let counter: u64 = 55555555;
        let secret_bytes = decode_base32(RFC_SECRET).unwrap();
        let code = code_at(&secret_bytes, counter).unwrap();

        // 前後1ステップまでは一致扱い
        for offset in [-1i64, 0, 1] {
            let at = ((counter as i64 + offset) as u64) * PERIOD;
            assert!(
                TotpService::verify_code_at(RFC_SECRET, &code, at).unwrap(),
                "offset = {}",
                offset
            );
        }

        // 2ステップ以上ずれたら不一致
        for offset in [-2i64, 2] {
            let at = ((counter as i64 + offset) as u64) * PERIOD;
            assert!(
                !TotpService::verify_code_at(RFC_SECRET, &code, at).unwrap(),
                "offset = {}",
                offset
            );
        }
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        let at = 59;
        assert!(!TotpService::verify_code_at(RFC_SECRET, "12a456", at).unwrap());
        assert!(!TotpService::verify_code_at(RFC_SECRET, "12345", at).unwrap());
        assert!(!TotpService::verify_code_at(RFC_SECRET, "1234567", at).unwrap());
        assert!(!TotpService::verify_code_at(RFC_SECRET, "", at).unwrap());
    }

    #[test]
    fn test_generate_secret() {
        let secret = TotpService::generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.bytes().all(|b| ALPHABET.contains(&b)));

        // 2回の生成が一致する確率は 32^-32
        assert_ne!(secret, TotpService::generate_secret());
    }

    #[test]
    fn test_generate_backup_codes() {
        let codes = TotpService::generate_backup_codes();
        assert_eq!(codes.len(), 10);
        for code in &codes {
            assert_eq!(code.len(), 8);
            assert!(code.bytes().all(|b| BACKUP_CODE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_provisioning_uri_format() {
        let service = create_test_service();
        let uri = service.provisioning_uri("patrol@example.com", RFC_SECRET);

        assert!(uri.starts_with("otpauth://totp/TestApp:patrol%40example.com?"));
        assert!(uri.contains(&format!("secret={}", RFC_SECRET)));
        assert!(uri.contains("issuer=TestApp"));
        assert!(uri.contains("algorithm=SHA1"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn test_qr_code_url_percent_encodes_uri() {
        let service = create_test_service();
        let uri = service.provisioning_uri("patrol@example.com", RFC_SECRET);
        let url = service.qr_code_url(&uri);

        assert!(url.starts_with("https://qr.example.com/render?size=256x256&data=otpauth%3A%2F%2F"));
    }

    #[test]
    fn test_encrypt_decrypt_secret() {
        let service = create_test_service();
        let original = TotpService::generate_secret();

        let encrypted = service.encrypt_secret(&original).unwrap();
        // 12バイトnonce + 暗号文 + 16バイトtag
        assert!(encrypted.len() > 12);

        let decrypted = service.decrypt_secret(&encrypted).unwrap();
        assert_eq!(original, decrypted);
    }

    #[test]
    fn test_new_with_invalid_key_length() {
        let short_key = STANDARD.encode([0u8; 16]);
        let result = TotpService::new(
            "TestApp".to_string(),
            "https://qr.example.com".to_string(),
            &short_key,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_against_reference_implementation() {
        // 独立した参照実装 (totp-rs) が生成したコードを受理すること
        use totp_rs::{Algorithm, TOTP};

        let service = create_test_service();
        let secret = TotpService::generate_secret();
        let secret_bytes = decode_base32(&secret).unwrap();

        let reference = TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            secret_bytes,
            None,
            String::new(),
        )
        .unwrap();
        let code = reference.generate_current().unwrap();

        assert!(service.verify_code(&secret, &code).unwrap());

        if code != "000000" {
            assert!(!service.verify_code(&secret, "000000").unwrap());
        }
    }
}
