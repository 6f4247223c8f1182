//! # API レスポンスプラグイン
//!
//! 起動時に API クライアントのレジストリへ 1 回だけ登録するインターセプタ。
//!
//! - 成功: エンベロープをデバッグログに出し、そのまま返す
//! - 失敗: エラーログを出し、コードごとに後処理する
//!
//! | code | 後処理 |
//! |------|--------|
//! | 401 | ログイン画面（[`LOGIN_PATH`]）へ遷移 |
//! | 403 | 権限不足をログに出す |
//! | 500 | サーバーエラーをログに出す |
//! | その他 | メッセージをログに出す |

use std::sync::Arc;

use portal_client::{ApiError, Envelope, InterceptorRegistry, ResponseInterceptor};

/// 認証切れ時の遷移先
pub const LOGIN_PATH: &str = "/login";

/// 画面遷移の抽象
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// 遷移をログイベントとして記録する `Navigator`
///
/// サーバー側にはブラウザがないため、遷移要求はログに残すだけにする。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to(&self, path: &str) {
        tracing::info!(path, "画面遷移を要求しました");
    }
}

/// ログ出力と認証切れ時の遷移を行うインターセプタ
pub struct ApiResponsePlugin {
    navigator: Arc<dyn Navigator>,
}

impl ApiResponsePlugin {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl ResponseInterceptor for ApiResponsePlugin {
    fn on_response(&self, response: Envelope) -> Envelope {
        tracing::debug!(
            code = response.code,
            message = %response.message,
            "API レスポンス"
        );
        response
    }

    fn on_response_error(&self, error: &ApiError) {
        tracing::error!(
            code = error.code,
            kind = ?error.kind,
            "API エラー: {}",
            error.message
        );

        match error.code {
            401 => self.navigator.navigate_to(LOGIN_PATH),
            403 => tracing::error!("この操作を行う権限がありません"),
            500 => tracing::error!("サーバーエラーが発生しました"),
            _ => tracing::error!("リクエストに失敗しました: {}", error.message),
        }
    }
}

/// プラグインをレジストリに登録する
///
/// 既存の登録は置き換わる。
pub fn install(registry: &InterceptorRegistry, navigator: Arc<dyn Navigator>) {
    registry.register(ApiResponsePlugin::new(navigator));
    tracing::debug!("API レスポンスプラグインを登録しました");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use portal_shared::ApiResponse;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    /// 遷移先を記録する `Navigator`
    #[derive(Default)]
    struct RecordingNavigator {
        paths: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn paths(&self) -> Vec<String> {
            self.paths.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate_to(&self, path: &str) {
            self.paths.lock().unwrap().push(path.to_string());
        }
    }

    #[test]
    fn test_成功レスポンスはそのまま返す() {
        let plugin = ApiResponsePlugin::new(Arc::new(TracingNavigator));
        let envelope = ApiResponse::ok(json!({"id": 1}));

        let result = plugin.on_response(envelope.clone());

        assert_eq!(result, envelope);
    }

    #[test]
    fn test_401ならログイン画面へ遷移する() {
        let navigator = Arc::new(RecordingNavigator::default());
        let plugin = ApiResponsePlugin::new(navigator.clone());

        plugin.on_response_error(&ApiError::application(401, "session expired", None));

        assert_eq!(navigator.paths(), vec![LOGIN_PATH.to_string()]);
    }

    #[test]
    fn test_通信エラーの401でも遷移する() {
        let navigator = Arc::new(RecordingNavigator::default());
        let plugin = ApiResponsePlugin::new(navigator.clone());

        plugin.on_response_error(&ApiError::transport(Some(StatusCode::UNAUTHORIZED), ""));

        assert_eq!(navigator.paths(), vec![LOGIN_PATH.to_string()]);
    }

    #[rstest]
    #[case(403)]
    #[case(404)]
    #[case(500)]
    fn test_401以外では遷移しない(#[case] code: i64) {
        let navigator = Arc::new(RecordingNavigator::default());
        let plugin = ApiResponsePlugin::new(navigator.clone());

        plugin.on_response_error(&ApiError::application(code, "failed", None));

        assert!(navigator.paths().is_empty());
    }

    #[test]
    fn test_installでレジストリ経由の呼び出しに反映される() {
        let navigator = Arc::new(RecordingNavigator::default());
        let registry = InterceptorRegistry::new();

        install(&registry, navigator.clone());
        registry
            .current()
            .on_response_error(&ApiError::application(401, "unauthorized", None));

        assert_eq!(navigator.paths(), vec![LOGIN_PATH.to_string()]);
    }
}
