//! # Web サーバー設定
//!
//! 環境変数から実行時設定を読み込む。
//!
//! ## 環境変数一覧
//!
//! | 変数名 | デフォルト | 説明 |
//! |--------|------------|------|
//! | `APP_ENV`（なければ `NODE_ENV`） | `development` | 実行環境 |
//! | `API_BASE_URL` | `http://localhost:4000` | バックエンド API のベース URL |
//! | `API_TIMEOUT` | `10000` | API タイムアウト（ミリ秒） |
//! | `APP_NAME` | `Portal App` | アプリケーション名 |
//! | `APP_VERSION` | `1.0.0` | アプリケーションバージョン |
//! | `DEBUG` | `false` | `true` のときデバッグ出力を有効にする |
//! | `LOG_LEVEL` | `info` | ログレベル |
//! | `NITRO_HOST`（なければ `PORTAL_HOST`） | `localhost` | バインドアドレス |
//! | `NITRO_PORT`（なければ `PORTAL_PORT`） | `3000` | ポート番号 |
//! | `API_AUTH_TOKEN` | なし | `/api` 配下で期待する Bearer トークン |
//! | `AUTH_ENFORCE` | `false` | `true` のとき認可に失敗したリクエストを 401 で拒否する |
//!
//! 空文字の変数は未設定として扱う。
//!
//! テストでは [`EnvironmentConfig::from_lookup`] に値の取得関数を渡し、
//! プロセスの環境変数に触れずに検証する。

use std::{env, fmt, str::FromStr, time::Duration};

use portal_client::ClientConfig;
use serde::Serialize;
use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_APP_NAME: &str = "Portal App";
const DEFAULT_APP_VERSION: &str = "1.0.0";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 数値として解釈できない
    #[error("{key} は数値である必要があります: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    /// http(s) の URL として解釈できない
    #[error("{key} は http:// または https:// の URL である必要があります: {value:?}")]
    InvalidUrl { key: &'static str, value: String },
}

/// 実行環境
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
    /// 既知の値以外（`staging` など）
    Other(String),
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "development" => Self::Development,
            "production" => Self::Production,
            "test" => Self::Test,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
            Self::Other(name) => name,
        }
    }

    pub fn is_development(&self) -> bool {
        *self == Self::Development
    }

    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }

    pub fn is_test(&self) -> bool {
        *self == Self::Test
    }
}

/// バックエンド API 設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// ベース URL（末尾スラッシュなし）
    pub base_url: String,
    pub timeout:  Duration,
}

impl ApiConfig {
    /// API クライアントのデフォルト設定に変換する
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, self.timeout)
    }
}

/// アプリケーション情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name:    String,
    pub version: String,
}

/// デバッグ設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConfig {
    pub enabled:   bool,
    pub log_level: String,
}

/// HTTP サーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `TcpListener::bind` に渡すアドレス（`host:port`）
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `/api` 配下の認可設定
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// 期待する Bearer トークン。未設定なら全リクエストが未認可になる
    pub expected_token: Option<String>,
    /// 未認可リクエストを拒否するか（`false` なら警告ログのみ）
    pub enforce:        bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "expected_token",
                &self.expected_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("enforce", &self.enforce)
            .finish()
    }
}

/// 実行時設定全体
///
/// 起動時に一度だけ構築し、各コンポーネントに渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub env:    Environment,
    pub api:    ApiConfig,
    pub app:    AppInfo,
    pub debug:  DebugConfig,
    pub server: ServerConfig,
    pub auth:   AuthConfig,
}

impl EnvironmentConfig {
    /// プロセスの環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の取得関数から読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let env = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .map_or(Environment::Development, |value| Environment::parse(&value));

        let base_url = var("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        validate_http_url("API_BASE_URL", &base_url)?;
        let timeout_ms = parse_number("API_TIMEOUT", var("API_TIMEOUT"), DEFAULT_API_TIMEOUT_MS)?;

        Ok(Self {
            env,
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout:  Duration::from_millis(timeout_ms),
            },
            app: AppInfo {
                name:    var("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
                version: var("APP_VERSION").unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
            },
            debug: DebugConfig {
                enabled:   parse_flag(var("DEBUG").as_deref()),
                log_level: var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            },
            server: ServerConfig {
                host: var("NITRO_HOST")
                    .or_else(|| var("PORTAL_HOST"))
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: match var("NITRO_PORT") {
                    Some(port) => parse_number("NITRO_PORT", Some(port), DEFAULT_PORT)?,
                    None => parse_number("PORTAL_PORT", var("PORTAL_PORT"), DEFAULT_PORT)?,
                },
            },
            auth: AuthConfig {
                expected_token: var("API_AUTH_TOKEN"),
                enforce:        parse_flag(var("AUTH_ENFORCE").as_deref()),
            },
        })
    }

    /// ブラウザに公開してよい設定だけを取り出す
    ///
    /// タイムアウトや認可トークンは含めない。
    pub fn public(&self) -> PublicConfig {
        PublicConfig {
            env:   PublicEnv {
                current:        self.env.as_str().to_string(),
                is_development: self.env.is_development(),
                is_production:  self.env.is_production(),
                is_test:        self.env.is_test(),
            },
            api:   PublicApi {
                base_url: self.api.base_url.clone(),
            },
            app:   self.app.clone(),
            debug: self.debug.clone(),
        }
    }
}

/// 公開設定（`GET /api/_config` のレスポンス）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicConfig {
    pub env:   PublicEnv,
    pub api:   PublicApi,
    pub app:   AppInfo,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEnv {
    pub current:        String,
    pub is_development: bool,
    pub is_production:  bool,
    pub is_test:        bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicApi {
    pub base_url: String,
}

/// `true`（大文字小文字を問わない）のときだけ有効
fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_number<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

fn validate_http_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        }),
    }
}
