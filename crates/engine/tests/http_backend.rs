use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use api_types::{
    PageQuery,
    auth::OtpVerify,
    product::Product,
    wallet::MobileMoneyRequest,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use engine::{
    ApiError, ErrorKind, HttpBackend,
    backend::{AuthApi, ProductApi, WalletApi},
    editor::Draft,
};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    query: Option<String>,
    bearer: Option<String>,
    idempotency_key: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn backend(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    log.lock().unwrap().push(Seen {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        bearer: header("authorization"),
        idempotency_key: header("idempotency-key"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    match (method.as_str(), uri.path()) {
        ("POST", "/api/auth/otp/verify") => Json(json!({
            "id": "f1",
            "email": "a@b.com",
            "name": "Wanjiku",
            "phone": "+254700000001",
            "role": "farmer",
            "token": "tok"
        }))
        .into_response(),
        ("GET", "/api/products") => Json(json!({
            "data": [],
            "total": 0,
            "page": 2,
            "limit": 5
        }))
        .into_response(),
        ("POST", "/api/products") => Json(json!({
            "id": "p9",
            "farmer_id": "f1",
            "name": "Maize",
            "category": "produce",
            "quantity": 3.0,
            "unit": "kg",
            "price_minor": 4500,
            "status": "available"
        }))
        .into_response(),
        ("POST", "/api/wallet/topup") => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "amount below minimum" })),
        )
            .into_response(),
        ("GET", "/api/dashboard/f1") => StatusCode::UNAUTHORIZED.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve() -> (String, Log) {
    let log = Log::default();
    let app = Router::new().fallback(backend).with_state(log.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), log)
}

fn client(base: &str, token: Option<&str>) -> HttpBackend {
    HttpBackend::new(base, Duration::from_secs(5))
        .unwrap()
        .with_token(token.map(str::to_string))
}

#[tokio::test]
async fn login_verify_posts_body_without_token() {
    let (base, log) = serve().await;
    let user = client(&base, None)
        .verify_login_otp(&OtpVerify {
            email: "a@b.com".to_string(),
            otp: "123456".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, "f1");
    assert_eq!(user.token.as_deref(), Some("tok"));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.bearer, None);
    assert_eq!(seen.body, json!({ "email": "a@b.com", "otp": "123456" }));
}

#[tokio::test]
async fn product_listing_sends_filters_as_query() {
    let (base, log) = serve().await;
    let query = PageQuery {
        page: 2,
        limit: 5,
        search: Some("maize".to_string()),
        category: Some("grain".to_string()),
        facet: Some("available".to_string()),
        scope: None,
    };
    let page = client(&base, Some("tok")).list_products(&query).await.unwrap();
    assert_eq!(page.page, 2);

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.path, "/api/products");
    assert_eq!(
        seen.query.as_deref(),
        Some("page=2&limit=5&search=maize&category=grain&status=available")
    );
    assert_eq!(seen.bearer.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn create_carries_idempotency_key_and_omits_id() {
    let (base, log) = serve().await;
    let mut draft = Product::defaults();
    draft.name = "Maize".to_string();
    let saved = client(&base, Some("tok"))
        .create_product(&draft, "key-1")
        .await
        .unwrap();
    assert_eq!(saved.id.as_deref(), Some("p9"));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.idempotency_key.as_deref(), Some("key-1"));
    assert!(seen.body.get("id").is_none());
    assert_eq!(seen.body["category"], "produce");
}

#[tokio::test]
async fn unprocessable_maps_to_rejected_with_backend_message() {
    let (base, _log) = serve().await;
    let err = client(&base, Some("tok"))
        .top_up(&MobileMoneyRequest {
            farmer_id: "f1".to_string(),
            amount: 1,
            phone_number: "+254700000001".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, ApiError::Rejected(msg) if msg == "amount below minimum"));
    assert_eq!(err.kind(), ErrorKind::Rejected);
}

#[tokio::test]
async fn history_path_carries_farmer_and_type_filter() {
    let (base, log) = serve().await;
    let query = PageQuery {
        page: 1,
        limit: 10,
        facet: Some("deposit".to_string()),
        scope: Some("f1".to_string()),
        ..PageQuery::default()
    };
    let err = client(&base, Some("tok")).wallet_history(&query).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.path, "/api/wallet/f1/transactions");
    assert_eq!(seen.query.as_deref(), Some("page=1&limit=10&type=deposit"));
}

#[tokio::test]
async fn unauthorized_is_recognised() {
    use engine::{EngineError, backend::DashboardApi};

    let (base, _log) = serve().await;
    let err = client(&base, Some("expired")).dashboard("f1").await.unwrap_err();
    assert!(EngineError::from(err).is_unauthorized());
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(&format!("http://{addr}"), None)
        .request_login_otp(&api_types::auth::OtpRequest {
            email: "a@b.com".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
