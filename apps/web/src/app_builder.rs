//! # アプリケーション構築
//!
//! State の初期化とルーター構築を担当する。
//! `main.rs` は設定読み込みとサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{any, get},
};
use portal_client::ApiClient;
use portal_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::EnvironmentConfig,
    handler::{
        HealthState,
        ProxyState,
        PublicConfigState,
        get_public_config,
        health_check,
        proxy_api,
        readiness_check,
    },
    middleware::{AuthState, require_bearer_token},
};

/// ルーターを構築する
///
/// `api_client` はインターセプタ登録済みのものを渡す。
/// プロキシはエンベロープを解釈せず、素の reqwest クライアントで中継する。
pub fn build_app(config: &EnvironmentConfig, api_client: ApiClient) -> Router {
    let health_state = Arc::new(HealthState {
        version: config.app.version.clone(),
        api_client,
    });
    let config_state = Arc::new(PublicConfigState {
        public: config.public(),
    });
    let proxy_state = Arc::new(ProxyState::new(reqwest::Client::new(), &config.api));
    let auth_state = AuthState::from(&config.auth);

    // /api 配下のみ認可ミドルウェアを適用する
    // 静的ルート /api/_config はワイルドカードより優先される
    let api_routes = Router::new()
        .route("/api/_config", get(get_public_config))
        .with_state(config_state)
        .merge(
            Router::new()
                .route("/api/{*path}", any(proxy_api))
                .with_state(proxy_state),
        )
        .layer(from_fn_with_state(auth_state, require_bearer_token));

    // Request ID レイヤー（下に書いたものが外側）
    // 1. SetRequestIdLayer: UUID v7 を生成（クライアント提供値があればそれを使う）
    // 2. TraceLayer: request_id を含むスパンを作る
    // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(health_state)
        .merge(api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
