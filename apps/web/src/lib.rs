//! # Portal Web サーバー
//!
//! ブラウザとバックエンド API の間に立つフロントサーバー。
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Browser    │────▶│  portal-web  │────▶│ Backend API  │
//! │              │     │  port: 3000  │     │  port: 4000  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! ## モジュール構成
//!
//! - [`app_builder`]: ルーター構築
//! - [`config`]: 実行時設定（環境変数からの読み込み）
//! - [`error`]: プロキシのエラー定義と HTTP レスポンスへの変換
//! - [`handler`]: ヘルスチェック・公開設定・API プロキシ
//! - [`middleware`]: Bearer トークン認可
//! - [`plugin`]: API クライアントに登録するレスポンスインターセプタ

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod plugin;

pub use app_builder::build_app;
