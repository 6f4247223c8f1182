//! # レスポンスエンベロープの判定
//!
//! HTTP レスポンスを成功・アプリケーションエラー・通信エラーに分類し、
//! 呼び出し元に返す値（エンベロープの `data`）を取り出す。
//!
//! ## 判定ルール
//!
//! | HTTP | ボディ | 結果 |
//! |------|--------|------|
//! | 2xx | `code == 200` のエンベロープ | 成功フック適用後の `data` |
//! | 任意 | `code != 200` のエンベロープ | アプリケーションエラー |
//! | 非 2xx | それ以外 | 通信エラー（HTTP ステータス） |
//! | 2xx | エンベロープでない | 形式不正（通信エラー扱い、500） |
//!
//! 失敗時は登録済みのエラーフックを 1 回呼んでから `Err` を返す。

use portal_shared::ApiResponse;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{ApiError, ApiErrorKind},
    interceptor::{Envelope, InterceptorRegistry, ResponseInterceptor},
};

/// HTTP レスポンスを読み取り、エンベロープの `data` を `T` として返す
///
/// インターセプタはこの関数の呼び出し時点（レスポンス到着時点）の登録内容を使う。
pub async fn intercept_response<T: DeserializeOwned>(
    response: reqwest::Response,
    registry: &InterceptorRegistry,
) -> Result<T, ApiError> {
    let status = response.status();

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(
                error.category = "external_service",
                error.kind = "body_read",
                %status,
                "レスポンスボディの読み取りに失敗しました: {}",
                err
            );
            // 2xx のステータスはエラーコードにしない
            let error = ApiError::transport(Some(status).filter(|s| !s.is_success()), "");
            return Err(reject(registry.current().as_ref(), error));
        }
    };

    intercept_body(status, &body, registry)
}

/// 送信自体が失敗した（レスポンスが得られなかった）場合のエラーを作る
///
/// エラーフックを呼んだうえで、呼び出し元に返すエラーを返す。
pub fn reject_send_error(err: &reqwest::Error, registry: &InterceptorRegistry) -> ApiError {
    tracing::warn!(
        error.category = "external_service",
        error.kind = if err.is_timeout() { "timeout" } else { "network" },
        "API リクエストの送信に失敗しました: {}",
        err
    );
    reject(registry.current().as_ref(), ApiError::from_reqwest(err))
}

/// ステータスとボディから結果を決定する
pub fn intercept_body<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    registry: &InterceptorRegistry,
) -> Result<T, ApiError> {
    let interceptor = registry.current();

    let envelope = match classify(status, body) {
        Ok(envelope) => envelope,
        Err(error) => return Err(reject(interceptor.as_ref(), error)),
    };

    let envelope = interceptor.on_response(envelope);

    serde_json::from_value::<T>(envelope.data).map_err(|err| {
        tracing::warn!(
            error.category = "external_service",
            error.kind = "decode",
            "エンベロープの data を期待する型に変換できません: {}",
            err
        );
        reject(interceptor.as_ref(), ApiError::malformed_envelope(body))
    })
}

/// ステータスとボディを分類する（フックは呼ばない）
///
/// 成功時は未加工のエンベロープを返す。
pub fn classify(status: StatusCode, body: &str) -> Result<Envelope, ApiError> {
    let envelope = serde_json::from_str::<ApiResponse<Value>>(body).ok();

    match envelope {
        Some(envelope) if !envelope.is_success() => Err(ApiError::application(
            envelope.code,
            envelope.message,
            non_null(envelope.data),
        )),
        Some(envelope) if status.is_success() => Ok(envelope),
        _ if !status.is_success() => Err(ApiError::transport(Some(status), body)),
        _ => Err(ApiError::malformed_envelope(body)),
    }
}

/// エラーフックを呼び、同じエラーを返す
fn reject(interceptor: &dyn ResponseInterceptor, error: ApiError) -> ApiError {
    match error.kind {
        ApiErrorKind::Application => {
            tracing::debug!(code = error.code, "API がエラーを返しました: {}", error.message);
        }
        ApiErrorKind::Transport | ApiErrorKind::MalformedEnvelope => {
            tracing::debug!(code = error.code, kind = ?error.kind, "API 通信エラー: {}", error.message);
        }
    }
    interceptor.on_response_error(&error);
    error
}

/// 省略・null の `data` を `None` にする
fn non_null(data: Value) -> Option<Value> {
    match data {
        Value::Null => None,
        other => Some(other),
    }
}
