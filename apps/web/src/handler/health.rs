//! # ヘルスチェックハンドラ
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（バックエンド API の `/health` を確認する）
//!
//! Readiness Check は API クライアント経由で呼ぶため、上流もエンベロープ形式で
//! 応答する必要がある。失敗はインターセプタのエラーフックにも通知される。

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use portal_client::{ApiClient, FetchOptions};
use portal_shared::{CheckStatus, HealthResponse, ReadinessResponse};
use serde_json::Value;

/// 上流のヘルスチェックパス
const UPSTREAM_HEALTH_PATH: &str = "/health";

/// Readiness Check のタイムアウト
const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// ヘルスチェック用の State
pub struct HealthState {
    pub version:    String,
    pub api_client: ApiClient,
}

/// `GET /health`
pub async fn health_check(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.version.clone()))
}

/// `GET /health/ready`
///
/// 全チェック OK なら 200、1 つでも失敗すれば 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let mut checks = HashMap::new();
    checks.insert("api".to_string(), check_api(&state.api_client).await);

    let response = ReadinessResponse::from_checks(checks);
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

async fn check_api(client: &ApiClient) -> CheckStatus {
    let options = FetchOptions::new().with_timeout(READINESS_TIMEOUT);
    match client.get::<Value>(UPSTREAM_HEALTH_PATH, options).await {
        Ok(_) => CheckStatus::Ok,
        Err(e) => {
            tracing::warn!(code = e.code, error = %e, "readiness check: api health failed");
            CheckStatus::Error
        }
    }
}
