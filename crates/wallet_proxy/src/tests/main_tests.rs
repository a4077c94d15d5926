use super::*;
use axum::{body, body::Body, http::Request};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};
use tower::ServiceExt;

async fn spawn_backend(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let app = Router::new().route(
        "/api/wallet",
        post(move |Json(body): Json<Value>| {
            let recorder = recorder.clone();
            let reply = reply.clone();
            async move {
                recorder.lock().await.push(body);
                (status, Json(reply))
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), seen)
}

fn wallet_request(body: &str) -> Request<Body> {
    Request::post("/api/wallet")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = build_router(Arc::new(AppState::new("http://127.0.0.1:9")));
    let request = Request::get("/healthz").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"ok");
}

#[tokio::test]
async fn missing_address_is_rejected_without_forwarding() {
    let (backend_url, seen) = spawn_backend(StatusCode::OK, json!({ "success": true })).await;
    let app = build_router(Arc::new(AppState::new(backend_url)));

    for body in ["{}", r#"{"address":""}"#, r#"{"address":null}"#] {
        let response = app
            .clone()
            .oneshot(wallet_request(body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "success": false, "message": "Wallet address is required" })
        );
    }
    assert!(seen.lock().await.is_empty());
}

#[tokio::test]
async fn backend_status_and_body_are_relayed() {
    let reply = json!({ "success": true, "user": { "address": "0xabc" } });
    let (backend_url, seen) = spawn_backend(StatusCode::CREATED, reply.clone()).await;
    let app = build_router(Arc::new(AppState::new(format!("{backend_url}/"))));

    let response = app
        .oneshot(wallet_request(r#"{"address":"0xabc"}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await, reply);
    assert_eq!(*seen.lock().await, vec![json!({ "address": "0xabc" })]);
}

#[tokio::test]
async fn backend_failure_status_is_relayed_too() {
    let reply = json!({ "success": false, "message": "wallet banned" });
    let (backend_url, _seen) = spawn_backend(StatusCode::FORBIDDEN, reply.clone()).await;
    let app = build_router(Arc::new(AppState::new(backend_url)));

    let response = app
        .oneshot(wallet_request(r#"{"address":"0xabc"}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await, reply);
}

#[tokio::test]
async fn unreachable_backend_is_a_server_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let app = build_router(Arc::new(AppState::new(format!("http://{addr}"))));

    let response = app
        .oneshot(wallet_request(r#"{"address":"0xabc"}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "message": "Server error while processing wallet connection" })
    );
}

#[tokio::test]
async fn malformed_json_is_a_server_error() {
    let app = build_router(Arc::new(AppState::new("http://127.0.0.1:9")));
    let response = app
        .oneshot(wallet_request("not json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn address_is_trimmed_before_forwarding() {
    let (backend_url, seen) = spawn_backend(StatusCode::OK, json!({ "success": true })).await;
    let app = build_router(Arc::new(AppState::new(backend_url)));

    let blank = app
        .clone()
        .oneshot(wallet_request(r#"{"address":"   "}"#))
        .await
        .expect("response");
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let numeric = app
        .clone()
        .oneshot(wallet_request(r#"{"address":42}"#))
        .await
        .expect("response");
    assert_eq!(numeric.status(), StatusCode::BAD_REQUEST);

    let padded = app
        .oneshot(wallet_request(r#"{"address":"  0xabc\n"}"#))
        .await
        .expect("response");
    assert_eq!(padded.status(), StatusCode::OK);
    assert_eq!(*seen.lock().await, vec![json!({ "address": "0xabc" })]);
}
