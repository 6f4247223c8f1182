//! # Portal 共有ユーティリティ
//!
//! API クライアントと Web サーバーの両方から使われる共通の型を提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なデータ型とユーティリティのみを配置
//! - axum / reqwest には依存しない
//! - トレーシング初期化は `observability` feature の背後に置く

pub mod api_response;
pub mod error_response;
pub mod health;
pub mod observability;

pub use api_response::{ApiResponse, SUCCESS_CODE};
pub use error_response::ErrorResponse;
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
