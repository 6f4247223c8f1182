//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ```text
//! handler.rs            # 親モジュール（re-export）
//! └── handler/
//!     ├── app_config.rs # GET /api/_config
//!     ├── health.rs     # GET /health, GET /health/ready
//!     └── proxy.rs      # /api/{*path} → バックエンド API
//! ```

mod app_config;
mod health;
mod proxy;

pub use app_config::{PublicConfigState, get_public_config};
pub use health::{HealthState, health_check, readiness_check};
pub use proxy::{MAX_PROXY_BODY_BYTES, ProxyState, proxy_api, upstream_url};
