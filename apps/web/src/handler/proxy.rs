//! # API プロキシハンドラ
//!
//! `/api/{*path}` をバックエンド API の `{API_BASE_URL}/{path}` に中継する。
//!
//! - メソッド・クエリ・ボディ・エンドツーエンドヘッダーを転送する
//! - ホップバイホップヘッダー（`Connection` に列挙されたものを含む）は転送しない
//! - 上流のステータスとボディはそのまま返す
//! - 接続失敗は 502、タイムアウトは 504

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request, header},
    response::Response,
};
use portal_client::client::join_url;

use crate::{config::ApiConfig, error::ProxyError};

/// 中継するリクエストボディの上限
pub const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

/// プロキシ対象のパスプレフィックス
const API_PREFIX: &str = "/api";

/// 転送しないヘッダー
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    // 接続先と実際のボディ長から再計算される
    "host",
    "content-length",
];

/// プロキシの State
pub struct ProxyState {
    pub http_client:       reqwest::Client,
    pub upstream_base_url: String,
    pub timeout:           Duration,
}

impl ProxyState {
    pub fn new(http_client: reqwest::Client, api: &ApiConfig) -> Self {
        Self {
            http_client,
            upstream_base_url: api.base_url.clone(),
            timeout: api.timeout,
        }
    }
}

/// `ANY /api/{*path}`
#[tracing::instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn proxy_api(
    State(state): State<Arc<ProxyState>>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(parts.uri.path());
    let url = upstream_url(&state.upstream_base_url, path, parts.uri.query());

    let body = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
        .await
        .map_err(|e| ProxyError::InvalidRequestBody(e.to_string()))?;

    let upstream = state
        .http_client
        .request(parts.method, &url)
        .headers(end_to_end_headers(&parts.headers))
        .body(body)
        .timeout(state.timeout)
        .send()
        .await?;

    let status = upstream.status();
    let headers = end_to_end_headers(upstream.headers());
    let bytes = upstream.bytes().await?;
    tracing::debug!(%url, %status, "上流 API の応答を中継します");

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// 上流の URL を組み立てる
pub fn upstream_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    let url = join_url(base_url, path);
    match query {
        Some(query) if !query.is_empty() => format!("{url}?{query}"),
        _ => url,
    }
}

/// ホップバイホップヘッダーを除いたヘッダーを返す
fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut forwarded = headers.clone();
    for name in HOP_BY_HOP_HEADERS {
        forwarded.remove(*name);
    }
    for name in &connection_listed {
        forwarded.remove(name);
    }
    forwarded
}
