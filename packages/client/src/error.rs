//! API クライアントのエラー型

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// HTTP ステータスが取得できない失敗（ネットワークエラー等）で使うコード
pub const DEFAULT_TRANSPORT_CODE: i64 = 500;

/// ステータス文言が得られない通信失敗で使うメッセージ
pub const TRANSPORT_FAILURE_MESSAGE: &str = "ネットワークリクエストに失敗しました";

/// レスポンスがエンベロープ形式でない場合のメッセージ
pub const MALFORMED_ENVELOPE_MESSAGE: &str = "レスポンスの形式が不正です";

/// リクエストボディを JSON にできなかった場合のメッセージ
pub const REQUEST_BODY_MESSAGE: &str = "リクエストボディのシリアライズに失敗しました";

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// エンベロープが `code != 200` を返した
    Application,
    /// HTTP ステータスエラー、ネットワークエラー
    Transport,
    /// エンベロープとして解釈できないレスポンス（通信層の失敗として扱う）
    MalformedEnvelope,
}

/// API 呼び出しの失敗
///
/// アプリケーションエラーの場合は `code` / `message` / `data` をエンベロープからそのまま写し、
/// 通信エラーの場合は HTTP ステータス（なければ 500）と生のレスポンスボディを保持する。
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (code: {code})")]
pub struct ApiError {
    pub kind:    ApiErrorKind,
    pub code:    i64,
    pub message: String,
    pub data:    Option<Value>,
}

impl ApiError {
    /// エンベロープが失敗を示したときのエラー
    pub fn application(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            kind: ApiErrorKind::Application,
            code,
            message: message.into(),
            data,
        }
    }

    /// 通信層の失敗
    ///
    /// - `code`: HTTP ステータス。`None` の場合は [`DEFAULT_TRANSPORT_CODE`]
    /// - `message`: ステータスコードの標準文言（`canonical_reason`）。得られない場合は
    ///   [`TRANSPORT_FAILURE_MESSAGE`]。サーバーが返した独自の理由フレーズは reqwest から
    ///   取得できないため使わない
    /// - `data`: 生のレスポンスボディ（[`raw_body_data`] 参照）
    pub fn transport(status: Option<StatusCode>, body: &str) -> Self {
        let code = status.map_or(DEFAULT_TRANSPORT_CODE, |s| i64::from(s.as_u16()));
        let message = status
            .and_then(|s| s.canonical_reason())
            .unwrap_or(TRANSPORT_FAILURE_MESSAGE);

        Self {
            kind: ApiErrorKind::Transport,
            code,
            message: message.to_string(),
            data: raw_body_data(body),
        }
    }

    /// 2xx だがエンベロープとして解釈できなかったレスポンス
    ///
    /// 2xx のステータスはエラーコードとして意味を持たないため、コードは常に 500。
    pub fn malformed_envelope(body: &str) -> Self {
        Self {
            kind:    ApiErrorKind::MalformedEnvelope,
            code:    DEFAULT_TRANSPORT_CODE,
            message: MALFORMED_ENVELOPE_MESSAGE.to_string(),
            data:    raw_body_data(body),
        }
    }

    /// リクエストボディのシリアライズ失敗
    pub fn request_body(err: &serde_json::Error) -> Self {
        Self {
            kind:    ApiErrorKind::Transport,
            code:    DEFAULT_TRANSPORT_CODE,
            message: REQUEST_BODY_MESSAGE.to_string(),
            data:    Some(Value::String(err.to_string())),
        }
    }

    /// reqwest の送信エラーから変換する
    ///
    /// 接続失敗やタイムアウトはステータスを持たないので 500 になる。
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        Self::transport(err.status(), "")
    }

    pub fn is_application(&self) -> bool {
        self.kind == ApiErrorKind::Application
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::Transport | ApiErrorKind::MalformedEnvelope
        )
    }

    /// 認証切れ（401）か
    pub fn is_unauthorized(&self) -> bool {
        self.code == 401
    }
}

/// 生のレスポンスボディをエラーの `data` に変換する
///
/// 空ボディは `None`、JSON として読めればその値、読めなければ文字列として保持する。
pub fn raw_body_data(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}
