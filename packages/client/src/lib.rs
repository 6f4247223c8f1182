//! # Portal API クライアント
//!
//! バックエンド API の統一レスポンス `{ code, message, data }` を扱う HTTP クライアント。
//!
//! ## モジュール構成
//!
//! - `client`: リクエスト送信と GET / POST / PUT / DELETE の便利メソッド
//! - `error`: 呼び出し失敗を表す [`ApiError`]
//! - `interceptor`: 全リクエストの結果を観測するフックとその登録先
//! - `response`: レスポンスの成功・失敗判定とエンベロープの展開
//!
//! ## 使用例
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use portal_client::{ApiClient, ClientConfig, FetchOptions, InterceptorRegistry, ResponseHooks};
//!
//! # async fn run() -> Result<(), portal_client::ApiError> {
//! let registry = Arc::new(InterceptorRegistry::new());
//! registry.register(ResponseHooks::new().with_on_response_error(|error| {
//!     tracing::error!("API 応答エラー: {error}");
//! }));
//!
//! let client = ApiClient::new(
//!     ClientConfig::new("http://localhost:4000", Duration::from_secs(10)),
//!     registry,
//! );
//! let _user: serde_json::Value = client.get("/users/1", FetchOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod interceptor;
pub mod response;

pub use client::{ApiClient, ClientConfig, FetchOptions, RequestUrl};
pub use error::{ApiError, ApiErrorKind};
pub use interceptor::{Envelope, InterceptorRegistry, ResponseHooks, ResponseInterceptor};
