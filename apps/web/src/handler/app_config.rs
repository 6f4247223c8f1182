//! # 公開設定ハンドラ
//!
//! ブラウザ側が実行時に参照する設定を返す。

use std::sync::Arc;

use axum::{Json, extract::State};
use portal_shared::ApiResponse;

use crate::config::PublicConfig;

/// 公開設定ハンドラの State
pub struct PublicConfigState {
    pub public: PublicConfig,
}

/// `GET /api/_config`
///
/// 他の API と同じエンベロープ形式で返す。
pub async fn get_public_config(
    State(state): State<Arc<PublicConfigState>>,
) -> Json<ApiResponse<PublicConfig>> {
    Json(ApiResponse::ok(state.public.clone()))
}
