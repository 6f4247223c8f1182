//! # Bearer トークン認可ミドルウェア
//!
//! `/api` 配下のリクエストで `Authorization: Bearer <API_AUTH_TOKEN>` を検証する。
//!
//! - 既定では未認可リクエストを警告ログに残し、そのまま通す
//! - `AUTH_ENFORCE=true` のときは 401 で拒否する
//!
//! トークンが未設定の場合、すべてのリクエストが未認可になる。

use std::{fmt, sync::Arc};

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use portal_shared::ErrorResponse;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

const BEARER_PREFIX: &str = "Bearer ";

/// 認可ミドルウェアの状態
#[derive(Clone)]
pub struct AuthState {
    expected_token: Option<Arc<str>>,
    enforce:        bool,
}

impl AuthState {
    pub fn new(expected_token: Option<&str>, enforce: bool) -> Self {
        Self {
            expected_token: expected_token.map(Arc::from),
            enforce,
        }
    }
}

impl From<&AuthConfig> for AuthState {
    fn from(config: &AuthConfig) -> Self {
        Self::new(config.expected_token.as_deref(), config.enforce)
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("configured", &self.expected_token.is_some())
            .field("enforce", &self.enforce)
            .finish()
    }
}

/// 認可判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    /// `Authorization` ヘッダーがない
    MissingHeader,
    /// 期待するトークンが設定されていない
    NotConfigured,
    /// トークンが一致しない
    InvalidToken,
}

impl AuthOutcome {
    fn kind(self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::MissingHeader => "missing_header",
            Self::NotConfigured => "not_configured",
            Self::InvalidToken => "invalid_token",
        }
    }
}

/// `Authorization` ヘッダーの値を判定する
///
/// ヘッダー全体を `Bearer <expected>` と定数時間で比較する。
pub fn authorize_bearer(header: Option<&str>, expected_token: Option<&str>) -> AuthOutcome {
    let Some(header) = header else {
        return AuthOutcome::MissingHeader;
    };
    let Some(expected_token) = expected_token else {
        return AuthOutcome::NotConfigured;
    };

    let expected_header = format!("{BEARER_PREFIX}{expected_token}");
    let is_valid: bool = header.as_bytes().ct_eq(expected_header.as_bytes()).into();
    if is_valid {
        AuthOutcome::Authorized
    } else {
        AuthOutcome::InvalidToken
    }
}

/// ヘッダー値のまま判定する
///
/// 文字列として読めないヘッダーは、ヘッダーなしではなくトークン不一致として扱う。
fn authorize_header(value: Option<&HeaderValue>, expected_token: Option<&str>) -> AuthOutcome {
    match value.map(HeaderValue::to_str) {
        None => authorize_bearer(None, expected_token),
        Some(Ok(value)) => authorize_bearer(Some(value), expected_token),
        Some(Err(_)) => AuthOutcome::InvalidToken,
    }
}

/// Bearer トークン認可ミドルウェア
pub async fn require_bearer_token(
    State(state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let outcome = authorize_header(
        request.headers().get(header::AUTHORIZATION),
        state.expected_token.as_deref(),
    );

    if outcome == AuthOutcome::Authorized {
        return next.run(request).await;
    }

    tracing::warn!(
        error.category = "auth",
        error.kind = outcome.kind(),
        method = %request.method(),
        path = %request.uri().path(),
        enforce = state.enforce,
        "未認可のリクエストです"
    );

    if state.enforce {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::unauthorized("有効なアクセストークンが必要です")),
        )
            .into_response();
    }

    next.run(request).await
}
