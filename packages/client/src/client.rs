//! # API クライアント
//!
//! バックエンド API を呼び出し、レスポンスエンベロープを解いた `data` を返す。
//!
//! ## エンドポイントの指定
//!
//! - 相対パス（`/users/1`）は `base_url` に連結する
//! - `http://` / `https://` で始まる URL はそのまま使う
//! - [`RequestUrl::deferred`] で渡した URL はリクエスト送信時に評価する

use std::{fmt, sync::Arc, time::Duration};

use reqwest::{
    Method,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::ApiError,
    interceptor::{InterceptorRegistry, ResponseInterceptor},
    response::{intercept_response, reject_send_error},
};

/// クライアントのデフォルト設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API のベース URL（例: `http://localhost:4000`）
    pub base_url: String,
    /// リクエストタイムアウト。`None` の場合は reqwest のデフォルト（無制限）
    pub timeout:  Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout:  Some(timeout),
        }
    }
}

/// リクエスト先 URL
///
/// 文字列リテラルのほか、送信時に評価するクロージャを受け付ける。
#[derive(Clone)]
pub enum RequestUrl {
    Literal(String),
    Deferred(Arc<dyn Fn() -> String + Send + Sync>),
}

impl RequestUrl {
    pub fn deferred(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Deferred(Arc::new(f))
    }

    /// 現時点の URL を得る
    pub fn resolve(&self) -> String {
        match self {
            Self::Literal(url) => url.clone(),
            Self::Deferred(f) => f(),
        }
    }
}

impl fmt::Debug for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(url) => f.debug_tuple("Literal").field(url).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for RequestUrl {
    fn from(url: &str) -> Self {
        Self::Literal(url.to_string())
    }
}

impl From<String> for RequestUrl {
    fn from(url: String) -> Self {
        Self::Literal(url)
    }
}

impl From<&String> for RequestUrl {
    fn from(url: &String) -> Self {
        Self::Literal(url.clone())
    }
}

/// 呼び出しごとのオプション
///
/// 指定したフィールドだけがクライアントのデフォルトを上書きする。
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// HTTP メソッド（省略時は GET）
    pub method:   Option<Method>,
    /// JSON ボディ
    pub body:     Option<Value>,
    /// クエリパラメータ
    pub query:    Vec<(String, String)>,
    /// 追加ヘッダー
    pub headers:  HeaderMap,
    /// ベース URL の上書き
    pub base_url: Option<String>,
    /// タイムアウトの上書き
    pub timeout:  Option<Duration>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// エンベロープを解く API クライアント
///
/// インターセプタの登録先は起動時に注入する。
/// 複製しても同じ reqwest コネクションプールとレジストリを共有する。
#[derive(Debug, Clone)]
pub struct ApiClient {
    config:   ClientConfig,
    client:   reqwest::Client,
    registry: Arc<InterceptorRegistry>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, registry: Arc<InterceptorRegistry>) -> Self {
        Self::with_http_client(config, registry, reqwest::Client::new())
    }

    /// 設定済みの reqwest クライアントを使う
    pub fn with_http_client(
        config: ClientConfig,
        registry: Arc<InterceptorRegistry>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            client,
            registry,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InterceptorRegistry> {
        &self.registry
    }

    /// リクエストを送り、エンベロープの `data` を返す
    ///
    /// # エラー
    ///
    /// - エンベロープの `code != 200`: [`ApiErrorKind::Application`](crate::ApiErrorKind::Application)
    /// - HTTP ステータスエラー・接続失敗・タイムアウト: [`ApiErrorKind::Transport`](crate::ApiErrorKind::Transport)
    /// - エンベロープとして読めない 2xx: [`ApiErrorKind::MalformedEnvelope`](crate::ApiErrorKind::MalformedEnvelope)
    ///
    /// いずれの場合も、登録済みのエラーフックが 1 回呼ばれた後に返る。
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        url: impl Into<RequestUrl>,
        options: FetchOptions,
    ) -> Result<T, ApiError> {
        let base_url = options.base_url.as_deref().unwrap_or(&self.config.base_url);
        let url = join_url(base_url, &url.into().resolve());
        let method = options.method.unwrap_or(Method::GET);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .headers(options.headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = options.timeout.or(self.config.timeout) {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(%method, %url, "API リクエストを送信します");

        let result = match builder.send().await {
            Ok(response) => intercept_response(response, &self.registry).await,
            Err(err) => Err(reject_send_error(&err, &self.registry)),
        };

        match &result {
            Ok(_) => tracing::debug!(%method, %url, "API リクエストが成功しました"),
            Err(err) => tracing::debug!(%method, %url, code = err.code, "API リクエストが失敗しました"),
        }
        result
    }

    /// GET リクエスト
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: impl Into<RequestUrl>,
        options: FetchOptions,
    ) -> Result<T, ApiError> {
        self.fetch(url, options.with_method(Method::GET)).await
    }

    /// POST リクエスト（`body` を JSON で送る）
    pub async fn post<T, B>(
        &self,
        url: impl Into<RequestUrl>,
        body: &B,
        options: FetchOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = self.with_json_body(body, options)?;
        self.fetch(url, options.with_method(Method::POST)).await
    }

    /// PUT リクエスト（`body` を JSON で送る）
    pub async fn put<T, B>(
        &self,
        url: impl Into<RequestUrl>,
        body: &B,
        options: FetchOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = self.with_json_body(body, options)?;
        self.fetch(url, options.with_method(Method::PUT)).await
    }

    /// DELETE リクエスト
    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: impl Into<RequestUrl>,
        options: FetchOptions,
    ) -> Result<T, ApiError> {
        self.fetch(url, options.with_method(Method::DELETE)).await
    }

    /// ボディを JSON 値にしてオプションに固定する
    ///
    /// シリアライズ失敗も 1 回の呼び出し結果なので、エラーフックに通知する。
    fn with_json_body<B: Serialize + ?Sized>(
        &self,
        body: &B,
        options: FetchOptions,
    ) -> Result<FetchOptions, ApiError> {
        match serde_json::to_value(body) {
            Ok(value) => Ok(options.with_body(value)),
            Err(err) => {
                let error = ApiError::request_body(&err);
                self.registry.current().on_response_error(&error);
                Err(error)
            }
        }
    }
}

/// ベース URL とパスを連結する
///
/// 絶対 URL のパスはベース URL を無視する。
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || base_url.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
