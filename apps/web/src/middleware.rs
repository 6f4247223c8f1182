//! # ミドルウェア
//!
//! Web サーバー用のミドルウェアを提供する。

mod auth;

pub use auth::{AuthOutcome, AuthState, authorize_bearer, require_bearer_token};
