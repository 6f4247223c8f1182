//! # ApiClient 統合テスト
//!
//! wiremock でバックエンド API を模擬し、実際の HTTP 通信を通して
//! エンベロープの展開とインターセプタの呼び出しを検証する。
//!
//! ## テストケース
//!
//! - 成功エンベロープの `data` だけが返る
//! - POST / PUT はボディを JSON で送る、DELETE はメソッドを固定する
//! - `code != 200` はエラーフックを 1 回呼んでからエラーを返す
//! - 404（ボディなし）、接続失敗、タイムアウトは通信エラーになる
//! - ボディの読み取り途中で切断されても HTTP ステータスを保持する
//! - リクエスト中にフックを登録し直すと、完了時点のフックが使われる

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use portal_client::{
    ApiClient,
    ApiError,
    ApiErrorKind,
    ClientConfig,
    FetchOptions,
    InterceptorRegistry,
    RequestUrl,
    ResponseHooks,
    error::TRANSPORT_FAILURE_MESSAGE,
};
use portal_shared::ApiResponse;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id:   i64,
    name: String,
}

fn envelope(data: Value) -> Value {
    json!({ "code": 200, "message": "ok", "data": data })
}

fn client_for(server: &MockServer, registry: Arc<InterceptorRegistry>) -> ApiClient {
    ApiClient::new(
        ClientConfig::new(&server.uri(), Duration::from_secs(5)),
        registry,
    )
}

/// エラーフックに渡されたエラーを記録するレジストリ
fn recording_registry() -> (Arc<InterceptorRegistry>, Arc<Mutex<Vec<ApiError>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let registry = Arc::new(InterceptorRegistry::new());
    registry.register(ResponseHooks::new().with_on_response_error(move |error| {
        sink.lock().unwrap().push(error.clone());
    }));
    (registry, seen)
}

#[tokio::test]
async fn test_getで成功エンベロープのdataだけが返る() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"id": 1}))))
        .expect(1)
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    let result: Value = sut.get("/users/1", FetchOptions::new()).await.unwrap();

    assert_eq!(result, json!({"id": 1}));
}

#[tokio::test]
async fn test_postはボディをjsonで送る() {
    let server = MockServer::start().await;
    let new_user = User {
        id:   0,
        name: "Alice".to_string(),
    };
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(&new_user))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({"id": 7, "name": "Alice"}))),
        )
        .expect(1)
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    let created: User = sut.post("/users", &new_user, FetchOptions::new()).await.unwrap();

    assert_eq!(
        created,
        User {
            id:   7,
            name: "Alice".to_string(),
        }
    );
}

#[tokio::test]
async fn test_putはメソッドとボディを固定する() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/users/7"))
        .and(body_json(json!({"name": "Bob"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(true))))
        .expect(1)
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    // オプションで別のメソッドを指定しても PUT が優先される
    let options = FetchOptions::new().with_method(reqwest::Method::GET);
    let updated: bool = sut
        .put("/users/7", &json!({"name": "Bob"}), options)
        .await
        .unwrap();

    assert!(updated);
}

#[tokio::test]
async fn test_deleteでdataなしの成功を受け取れる() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 200, "message": "deleted"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    let result: Option<Value> = sut.delete("/users/7", FetchOptions::new()).await.unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_クエリとヘッダーが送られる() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "2"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(1)
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    let options = FetchOptions::new().with_query("page", "2").with_header(
        HeaderName::from_static("x-tenant"),
        HeaderValue::from_static("acme"),
    );
    let users: Vec<User> = sut.get("/users", options).await.unwrap();

    assert!(users.is_empty());
}

#[tokio::test]
async fn test_deferred_urlは送信時に評価される() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!("second"))))
        .expect(1)
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));
    let current = Arc::new(Mutex::new(1));
    let source = current.clone();
    let url = RequestUrl::deferred(move || format!("/items/{}", source.lock().unwrap()));

    *current.lock().unwrap() = 2;
    let result: String = sut.get(url, FetchOptions::new()).await.unwrap();

    assert_eq!(result, "second");
}

#[tokio::test]
async fn test_オプションのbase_urlがデフォルトを上書きする() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!("pong"))))
        .expect(1)
        .mount(&server)
        .await;
    let sut = ApiClient::new(
        ClientConfig::new("http://127.0.0.1:9", Duration::from_secs(5)),
        Arc::new(InterceptorRegistry::new()),
    );

    let options = FetchOptions::new().with_base_url(format!("{}/v2", server.uri()));
    let result: String = sut.get("/ping", options).await.unwrap();

    assert_eq!(result, "pong");
}

#[tokio::test]
async fn test_code403でエラーフックが1回呼ばれてからエラーが返る() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 403, "message": "forbidden"})),
        )
        .mount(&server)
        .await;
    let (registry, seen) = recording_registry();
    let sut = client_for(&server, registry);

    let error = sut
        .get::<Value>("/admin", FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.kind, ApiErrorKind::Application);
    assert_eq!(error.code, 403);
    assert_eq!(error.message, "forbidden");
    assert_eq!(error.data, None);
    assert_eq!(*seen.lock().unwrap(), vec![error]);
}

#[tokio::test]
async fn test_404でボディなしならステータス文言のエラー() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let (registry, seen) = recording_registry();
    let sut = client_for(&server, registry);

    let error = sut
        .get::<Value>("/missing", FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.kind, ApiErrorKind::Transport);
    assert_eq!(error.code, 404);
    assert_eq!(error.message, "Not Found");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_接続できなければ500と固定メッセージ() {
    // 空きポートを確保してから閉じ、接続拒否される宛先を作る
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (registry, seen) = recording_registry();
    let sut = ApiClient::new(
        ClientConfig::new(&format!("http://{addr}"), Duration::from_secs(5)),
        registry,
    );

    let error = sut
        .get::<Value>("/users", FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.kind, ApiErrorKind::Transport);
    assert_eq!(error.code, 500);
    assert_eq!(error.message, TRANSPORT_FAILURE_MESSAGE);
    assert_eq!(error.data, None);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ボディ途中で切断されてもステータスを保持する() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Content-Length より短いボディを送って切断するサーバー
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 100\r\n\r\nabc")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    let (registry, seen) = recording_registry();
    let sut = ApiClient::new(
        ClientConfig::new(&format!("http://{addr}"), Duration::from_secs(5)),
        registry,
    );

    let error = sut
        .get::<Value>("/x", FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.kind, ApiErrorKind::Transport);
    assert_eq!(error.code, 404);
    assert_eq!(error.message, "Not Found");
    assert_eq!(error.data, None);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_タイムアウトは通信エラーになる() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!(1)))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    let options = FetchOptions::new().with_timeout(Duration::from_millis(100));
    let error = sut.get::<Value>("/slow", options).await.unwrap_err();

    assert_eq!(error.code, 500);
    assert_eq!(error.message, TRANSPORT_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_成功フックの書き換えが呼び出し元に届く() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"id": 1}))))
        .mount(&server)
        .await;
    let registry = Arc::new(InterceptorRegistry::new());
    registry.register(ResponseHooks::new().with_on_response(|response| {
        response.map_data(|data| json!({ "wrapped": data }))
    }));
    let sut = client_for(&server, registry);

    let result: Value = sut.get("/users/1", FetchOptions::new()).await.unwrap();

    assert_eq!(result, json!({"wrapped": {"id": 1}}));
}

#[tokio::test]
async fn test_リクエスト中に登録し直すと完了時点のフックが使われる() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!("raw")))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    let registry = Arc::new(InterceptorRegistry::new());
    registry.register(
        ResponseHooks::new().with_on_response(|response| response.map_data(|_| json!("old"))),
    );
    let sut = client_for(&server, registry.clone());

    let in_flight = tokio::spawn({
        let sut = sut.clone();
        async move { sut.get::<String>("/slow", FetchOptions::new()).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    registry.register(
        ResponseHooks::new().with_on_response(|response| response.map_data(|_| json!("new"))),
    );

    let result = in_flight.await.unwrap().unwrap();

    assert_eq!(result, "new");
}

#[tokio::test]
async fn test_エンベロープを直接組み立てたレスポンスも展開できる() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ApiResponse::ok(User {
            id:   1,
            name: "Alice".to_string(),
        })))
        .mount(&server)
        .await;
    let sut = client_for(&server, Arc::new(InterceptorRegistry::new()));

    let user: User = sut.get("/users/1", FetchOptions::new()).await.unwrap();

    assert_eq!(user.name, "Alice");
}
