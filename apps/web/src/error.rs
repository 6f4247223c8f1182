//! # Web サーバーのエラーハンドリング
//!
//! プロキシ処理のエラー定義と、axum レスポンスへの変換。
//! レスポンスボディは [`ErrorResponse`]（RFC 9457）を使う。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portal_shared::ErrorResponse;
use thiserror::Error;

/// `/api` プロキシで発生するエラー
///
/// 上流が返したエラーステータスはそのまま中継するため、ここには含まれない。
#[derive(Debug, Error)]
pub enum ProxyError {
    /// リクエストボディを読み取れない（400 Bad Request）
    #[error("リクエストボディを読み取れません: {0}")]
    InvalidRequestBody(String),

    /// 上流 API に接続できない（502 Bad Gateway）
    #[error("上流 API への接続に失敗しました: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// 上流 API が時間内に応答しない（504 Gateway Timeout）
    #[error("上流 API がタイムアウトしました")]
    Timeout,
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Unreachable(err)
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ProxyError::InvalidRequestBody(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::bad_request(detail.clone()),
            ),
            ProxyError::Unreachable(err) => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "unreachable",
                    "上流 API への接続に失敗しました: {}",
                    err
                );
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::bad_gateway("上流 API に接続できません"),
                )
            }
            ProxyError::Timeout => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "timeout",
                    "上流 API がタイムアウトしました"
                );
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorResponse::gateway_timeout("上流 API が時間内に応答しませんでした"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
