//! # レスポンスインターセプタ
//!
//! すべての API 呼び出しの結果を観測するフックと、その登録先を提供する。
//!
//! ## 仕組み
//!
//! 1. アプリケーション起動時に [`InterceptorRegistry::register`] でフックを 1 組登録する
//! 2. [`ApiClient`](crate::ApiClient) はレスポンス到着時点の登録内容を読み出して呼び出す
//!
//! 登録は上書き（マージしない）。解除操作はなく、空の [`ResponseHooks`] を登録するとクリアされる。
//! リクエスト途中で登録し直した場合、そのリクエストが新旧どちらのフックを見るかは
//! レスポンスの到着順で決まる。

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use portal_shared::ApiResponse;
use serde_json::Value;

use crate::error::ApiError;

/// フックに渡されるエンベロープ（`data` は未デコードの JSON）
pub type Envelope = ApiResponse<Value>;

/// レスポンスインターセプタ
///
/// 2 つのメソッドはどちらもデフォルト実装を持ち、独立して省略できる。
pub trait ResponseInterceptor: Send + Sync {
    /// 成功エンベロープ（`code == 200`）を受け取り、呼び出し元に渡すエンベロープを返す
    ///
    /// 返したエンベロープの `data` が呼び出し元に届く。
    fn on_response(&self, response: Envelope) -> Envelope {
        response
    }

    /// 失敗を観測する
    ///
    /// 戻り値はなく、エラーの握りつぶしはできない。
    /// 呼び出し元には必ず同じエラーが返される。
    fn on_response_error(&self, _error: &ApiError) {}
}

type OnResponse = Arc<dyn Fn(Envelope) -> Envelope + Send + Sync>;
type OnResponseError = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// クロージャで組み立てるフックの組
///
/// ```
/// use portal_client::ResponseHooks;
///
/// let hooks = ResponseHooks::new()
///     .with_on_response(|response| response)
///     .with_on_response_error(|error| eprintln!("{error}"));
/// assert!(hooks.has_on_response());
/// ```
#[derive(Clone, Default)]
pub struct ResponseHooks {
    on_response:       Option<OnResponse>,
    on_response_error: Option<OnResponseError>,
}

impl ResponseHooks {
    /// 空のフック（何もしない）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_response(
        mut self,
        f: impl Fn(Envelope) -> Envelope + Send + Sync + 'static,
    ) -> Self {
        self.on_response = Some(Arc::new(f));
        self
    }

    pub fn with_on_response_error(mut self, f: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.on_response_error = Some(Arc::new(f));
        self
    }

    pub fn has_on_response(&self) -> bool {
        self.on_response.is_some()
    }

    pub fn has_on_response_error(&self) -> bool {
        self.on_response_error.is_some()
    }
}

impl fmt::Debug for ResponseHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHooks")
            .field("on_response", &self.has_on_response())
            .field("on_response_error", &self.has_on_response_error())
            .finish()
    }
}

impl ResponseInterceptor for ResponseHooks {
    fn on_response(&self, response: Envelope) -> Envelope {
        match &self.on_response {
            Some(f) => f(response),
            None => response,
        }
    }

    fn on_response_error(&self, error: &ApiError) {
        if let Some(f) = &self.on_response_error {
            f(error);
        }
    }
}

/// インターセプタの登録先
///
/// 1 つのインターセプタだけを保持する。`ApiClient` に `Arc` で注入して共有する。
/// 書き込みは起動時の 1 回を想定しており、書き込み同士の順序は保証しない（後勝ち）。
pub struct InterceptorRegistry {
    current: RwLock<Arc<dyn ResponseInterceptor>>,
}

impl InterceptorRegistry {
    /// 空のフックが登録された状態で作成する
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ResponseHooks::new())),
        }
    }

    /// インターセプタを登録する（既存の登録は丸ごと置き換わる）
    pub fn register(&self, interceptor: impl ResponseInterceptor + 'static) {
        self.register_arc(Arc::new(interceptor));
    }

    /// 共有済みのインターセプタを登録する
    pub fn register_arc(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        // フックはロック外で呼ぶ。poison していても中身はそのまま使える
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = interceptor;
    }

    /// 現在登録されているインターセプタ
    ///
    /// ロックは `Arc` の複製中だけ保持する。
    pub fn current(&self) -> Arc<dyn ResponseInterceptor> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry").finish_non_exhaustive()
    }
}
