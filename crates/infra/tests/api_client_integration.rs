//! End-to-end behavior of the request orchestrator against a mock upstream.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use storefront_domain::{ApiError, Payload, Product, StorefrontError};
use storefront_infra::http::StatusCode;
use storefront_infra::{ApiClient, RequestOptions};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client(base_url: &str, max_retries: u32) -> ApiClient {
    ApiClient::builder(base_url)
        .max_retries(max_retries)
        .retry_base_delay(Duration::from_millis(5))
        .timeout(Duration::from_secs(2))
        .build()
        .expect("api client")
}

#[tokio::test]
async fn retries_server_errors_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server.uri(), 3).get("/products/p1").await.expect("payload");

    assert_eq!(payload, Payload::Structured(json!({"id": "p1"})));
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

/// Answers 503 and records when each attempt arrived.
#[derive(Clone, Default)]
struct ArrivalLog(Arc<Mutex<Vec<Instant>>>);

impl ArrivalLog {
    fn arrivals(&self) -> Vec<Instant> {
        self.0.lock().unwrap().clone()
    }
}

impl Respond for ArrivalLog {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        self.0.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(503)
    }
}

#[tokio::test]
async fn waits_double_the_previous_delay_between_retries() {
    let server = MockServer::start().await;
    let log = ArrivalLog::default();
    Mock::given(method("GET")).respond_with(log.clone()).expect(3).mount(&server).await;

    let api = ApiClient::builder(server.uri())
        .max_retries(2)
        .retry_base_delay(Duration::from_millis(50))
        .build()
        .expect("api client");
    let started = Instant::now();
    let err = api.get("/products").await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.status(), Some(503));
    let arrivals = log.arrivals();
    assert_eq!(arrivals.len(), 3);

    let first_gap = arrivals[1].duration_since(arrivals[0]);
    let second_gap = arrivals[2].duration_since(arrivals[1]);
    assert!(first_gap >= Duration::from_millis(50), "first retry after {first_gap:?}");
    assert!(second_gap >= Duration::from_millis(100), "second retry after {second_gap:?}");
    assert!(elapsed >= Duration::from_millis(150), "total {elapsed:?}");
}

#[tokio::test]
async fn first_attempt_is_sent_without_delay() {
    let server = MockServer::start().await;
    let log = ArrivalLog::default();
    Mock::given(method("GET")).respond_with(log.clone()).expect(1).mount(&server).await;

    let api = ApiClient::builder(server.uri())
        .max_retries(0)
        .retry_base_delay(Duration::from_secs(2))
        .build()
        .expect("api client");
    let started = Instant::now();
    api.get("/products").await.unwrap_err();

    let arrivals = log.arrivals();
    assert_eq!(arrivals.len(), 1);
    assert!(arrivals[0].duration_since(started) < Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(1), "no wait after the final attempt");
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/slug/unknown"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server.uri(), 3).get("/products/slug/unknown").await.unwrap_err();

    assert_eq!(err, ApiError::protocol(404, "Not Found"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn persistent_failure_uses_exactly_n_plus_one_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server.uri(), 2).get("/products").await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn per_call_retry_budget_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::post().json(&json!({"qty": 1})).no_retry();
    let err = client(&server.uri(), 3).request("/orders", options).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn slow_response_is_classified_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let options = RequestOptions::get().timeout(Duration::from_millis(50)).no_retry();
    let err = client(&server.uri(), 3).request("/slow", options).await.unwrap_err();

    assert_eq!(err, ApiError::timeout(50));
}

#[tokio::test]
async fn timeout_applies_to_each_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fast"))
        .mount(&server)
        .await;

    let options = RequestOptions::get().timeout(Duration::from_millis(100)).max_retries(1);
    let payload = client(&server.uri(), 0).request("/flaky", options).await.expect("payload");

    assert_eq!(payload, Payload::Text("fast".into()));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Bind then drop to get a port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let err = client(&format!("http://127.0.0.1:{port}"), 1).get("/products").await.unwrap_err();

    assert!(matches!(err, ApiError::Network { .. }), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn negotiates_payload_by_content_type() {
    let server = MockServer::start().await;
    Mock::given(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    Mock::given(path("/problem"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"title": "fine"}"#, "application/problem+json"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let api = client(&server.uri(), 0);

    assert_eq!(api.get("/health").await.unwrap(), Payload::Text("ok".into()));
    assert_eq!(api.get("/problem").await.unwrap(), Payload::Structured(json!({"title": "fine"})));
    assert_eq!(api.get("/empty").await.unwrap(), Payload::Text(String::new()));
}

#[tokio::test]
async fn per_call_headers_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-store", "us"))
        .and(header("x-channel", "web"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::builder(server.uri())
        .default_header("x-store", "eu")
        .default_header("x-channel", "web")
        .build()
        .unwrap();

    let options = RequestOptions::get().header("X-Store", "us");
    api.request("/products", options).await.expect("payload");
}

#[tokio::test]
async fn writes_send_json_body_and_idempotency_key() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/products/p1"))
        .and(header("idempotency-key", "update-p1-1"))
        .and(body_json(json!({"inStock": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "p1", "inStock": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let options =
        RequestOptions::patch().json(&json!({"inStock": false})).idempotency_key("update-p1-1");
    let payload = client(&server.uri(), 0).request("products/p1", options).await.unwrap();

    let product: Product = payload.decode().unwrap();
    assert_eq!(product.in_stock, Some(false));
}

#[tokio::test]
async fn structured_error_body_populates_message_and_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"message": "price must be positive", "code": "VALIDATION"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server.uri(), 3).post("/products", &json!({"price": -1})).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Protocol {
            status: 422,
            message: "price must be positive".into(),
            code: Some("VALIDATION".into()),
            retryable: false,
        }
    );
}

#[tokio::test]
async fn caller_marked_status_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let options = RequestOptions::get().retry_on_status(StatusCode::TOO_MANY_REQUESTS);
    let payload = client(&server.uri(), 2).request("/products", options).await.unwrap();

    assert_eq!(payload, Payload::Structured(json!([])));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn unmarked_client_error_stops_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server.uri(), 2).get("/products").await.unwrap_err();
    assert!(err.halts_retry());
}

#[tokio::test]
async fn custom_accept_predicate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::get().accept_status(|s| s.is_success() || s == 304);
    let payload = client(&server.uri(), 0).request("/products", options).await.unwrap();
    assert_eq!(payload, Payload::Text(String::new()));
}

#[tokio::test]
async fn get_json_decodes_typed_values() {
    let server = MockServer::start().await;
    Mock::given(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "p1", "slug": "mug", "inStock": true}])),
        )
        .mount(&server)
        .await;
    Mock::given(path("/banner"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<b>sale</b>"))
        .mount(&server)
        .await;

    let api = client(&server.uri(), 0);

    let products: Vec<Product> = api.get_json("/products").await.unwrap();
    assert_eq!(products[0].slug.as_deref(), Some("mug"));

    let err = api.get_json::<Vec<Product>>("/banner").await.unwrap_err();
    assert!(matches!(err, StorefrontError::Decode(_)));
}
