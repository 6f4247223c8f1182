//! # Portal Web サーバー
//!
//! ## 環境変数
//!
//! 一覧は [`portal_web::config`] を参照。`.env` ファイルがあれば読み込む。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（.env ファイルを使用）
//! cargo run -p portal-web
//!
//! # 本番環境（環境変数を直接指定）
//! APP_ENV=production API_BASE_URL=https://api.example.com cargo run -p portal-web --release
//! ```

use std::sync::Arc;

use anyhow::Context;
use portal_client::{ApiClient, InterceptorRegistry};
use portal_shared::observability::{TracingConfig, init_tracing};
use portal_web::{
    build_app,
    config::EnvironmentConfig,
    plugin::{self, TracingNavigator},
};
use tokio::net::TcpListener;

/// Web サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. アプリケーション設定の読み込み
/// 3. トレーシングの初期化（設定のログレベルを使う）
/// 4. API クライアントとインターセプタの登録
/// 5. ルーターの構築と HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    let config = EnvironmentConfig::from_env().context("設定の読み込みに失敗しました")?;

    init_tracing(TracingConfig::from_env(
        "web",
        &config.debug.log_level,
        config.debug.enabled,
    ));
    let _tracing_guard = tracing::info_span!("app", service = "web").entered();

    tracing::info!(
        env = config.env.as_str(),
        app = %config.app.name,
        version = %config.app.version,
        api_base_url = %config.api.base_url,
        "Web サーバーを起動します: {}",
        config.server.bind_addr()
    );
    if config.auth.expected_token.is_none() {
        tracing::warn!("API_AUTH_TOKEN が未設定のため、/api 配下のリクエストはすべて未認可になります");
    }

    // インターセプタは起動時に 1 回だけ登録する
    let registry = Arc::new(InterceptorRegistry::new());
    plugin::install(&registry, Arc::new(TracingNavigator));
    let api_client = ApiClient::new(config.api.client_config(), registry);

    let app = build_app(&config, api_client);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{addr} へのバインドに失敗しました"))?;
    tracing::info!("Web サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
