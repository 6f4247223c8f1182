//! # API レスポンスエンベロープ
//!
//! バックエンド API の統一レスポンス形式 `{ "code": i64, "message": String, "data": T }` を提供する。
//!
//! `code == 200` が成功を表し、それ以外はすべてアプリケーションエラーとして扱う。
//! `data` は成功時のみ意味を持つ。

use serde::{Deserialize, Serialize};

/// 成功を表すエンベロープのステータスコード
pub const SUCCESS_CODE: i64 = 200;

/// バックエンド API の統一レスポンス型
///
/// この型は以下の場所で使用される:
/// - API クライアント（Deserialize でバックエンドのレスポンスを受け取る）
/// - Web サーバーのハンドラ（Serialize でブラウザにレスポンスを返す）
///
/// `data` が省略されたエンベロープ（例: `{"code": 403, "message": "forbidden"}`）は
/// `T::default()` として読み込まれる。
///
/// ## 使用例
///
/// ```
/// use portal_shared::ApiResponse;
///
/// let response = ApiResponse::ok("hello");
/// assert!(response.is_success());
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code:    i64,
    pub message: String,
    #[serde(default)]
    pub data:    T,
}

impl<T> ApiResponse<T> {
    /// 任意のコードで `ApiResponse` を作成する
    pub fn new(code: i64, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// 成功レスポンス（`code = 200`, `message = "ok"`）を作成する
    pub fn ok(data: T) -> Self {
        Self::new(SUCCESS_CODE, "ok", data)
    }

    /// エンベロープが成功を示しているか
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// `code` と `message` を保ったまま `data` を変換する
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            code:    self.code,
            message: self.message,
            data:    f(self.data),
        }
    }
}
