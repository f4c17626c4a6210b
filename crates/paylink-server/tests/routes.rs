use actix_web::{test, web, App};
use paylink::{
    CreateRequest, CreatedRequest, FulfillmentReport, PaymentService, RequestDetails, RequestId,
    ServiceError, TokenType,
};
use paylink_server::{AppState, ServerConfig};
use std::collections::HashMap;
use std::sync::Mutex;

const RECIPIENT: &str = "0xabc0000000000000000000000000000000000123";

#[derive(Default)]
struct MockService {
    created: Mutex<Vec<CreateRequest>>,
    reports: Mutex<Vec<FulfillmentReport>>,
}

impl PaymentService for MockService {
    async fn create_request(&self, request: &CreateRequest) -> Result<CreatedRequest, ServiceError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(CreatedRequest {
            request_id: RequestId::new("req-1").unwrap(),
            link: "https://peanut.to/request/pay?id=req-1".to_string(),
        })
    }

    async fn get_request_details(&self, id: &RequestId) -> Result<RequestDetails, ServiceError> {
        if id.as_str() != "req-1" {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        Ok(RequestDetails {
            recipient_address: RECIPIENT.to_string(),
            chain_id: 42161,
            token_address: None,
            token_amount: "25".to_string(),
            token_decimals: 6,
            token_symbol: None,
            token_type: TokenType::Erc20,
        })
    }

    async fn submit_fulfillment(&self, report: &FulfillmentReport) -> Result<(), ServiceError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

fn make_state(vars: &[(&str, &str)]) -> web::Data<AppState<MockService>> {
    let mut map: HashMap<&str, &str> = HashMap::from([
        ("APP_URL", "https://pay.example.com"),
        ("PEANUT_API_KEY", "test-key"),
    ]);
    map.extend(vars.iter().copied());
    let config = ServerConfig::from_lookup(|name| map.get(name).map(|v| v.to_string())).unwrap();
    web::Data::new(AppState::with_service(config, MockService::default()))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(paylink_server::configure::<MockService>),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_health_reports_link_mode() {
    let state = make_state(&[]);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["linkMode"], "tracked");
    assert_eq!(body["trackedRequests"], true);
}

#[actix_rt::test]
async fn test_simple_link_is_encoded_in_path() {
    let state = make_state(&[("LINK_MODE", "simple")]);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({"recipient": RECIPIENT, "amount": "10"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["mode"], "simple");
    assert_eq!(body["path"], format!("/pay/{RECIPIENT}/10usdc"));
    assert_eq!(
        body["link"],
        format!("https://pay.example.com/pay/{RECIPIENT}/10usdc")
    );
    assert!(state.service.created.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_tracked_link_is_rehosted() {
    let state = make_state(&[]);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({
            "recipient": RECIPIENT,
            "amount": "5",
            "isAdvancedMode": true,
            "chain": "polygon",
            "token": "usdt"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["mode"], "tracked");
    assert_eq!(body["requestId"], "req-1");
    assert_eq!(body["link"], "https://pay.example.com/pay?id=req-1");

    let created = state.service.created.lock().unwrap();
    assert_eq!(created[0].chain_id, 137);
    assert_eq!(created[0].token_symbol, "USDT");
}

#[actix_rt::test]
async fn test_default_chain_applies_outside_advanced_mode() {
    let state = make_state(&[("DEFAULT_CHAIN", "arbitrum")]);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({"recipient": RECIPIENT, "amount": "1", "chain": "polygon"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 201);
    assert_eq!(state.service.created.lock().unwrap()[0].chain_id, 42161);
}

#[actix_rt::test]
async fn test_configured_chain_survives_simple_links() {
    let state = make_state(&[("DEFAULT_CHAIN", "arbitrum"), ("LINK_MODE", "simple")]);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({"recipient": RECIPIENT, "amount": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let path = body["path"].as_str().unwrap().to_string();
    assert_eq!(path, format!("/pay/{RECIPIENT}/arbitrum/1usdc"));

    let uri = format!("/api/links/resolve?link={}", urlencoding::encode(&path));
    let req = test::TestRequest::get().uri(&uri).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["chainId"], 42161);

    // A link without a chain is on the built-in default network.
    let uri = format!("/api/links/resolve?link=%2Fpay%2F{RECIPIENT}%2F1usdc");
    let req = test::TestRequest::get().uri(&uri).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["chainId"], 10);
}

#[actix_rt::test]
async fn test_invalid_form_returns_field_errors() {
    let state = make_state(&[]);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({"recipient": "not-an-address", "amount": "0"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"recipient"));
    assert!(fields.contains(&"amount"));
}

#[actix_rt::test]
async fn test_tracked_without_key_is_unavailable() {
    let state = make_state(&[("PEANUT_API_KEY", "")]);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({"recipient": RECIPIENT, "amount": "10"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let req = test::TestRequest::get().uri("/api/requests/req-1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    // Open-ended links never need the service.
    let req = test::TestRequest::post()
        .uri("/api/links")
        .set_json(serde_json::json!({"recipient": "alice.eth"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
}

#[actix_rt::test]
async fn test_decode_link() {
    let state = make_state(&[]);
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/links/decode?link=%2Fpay%3Fid%3Dreq-1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "byIdentifier");
    assert_eq!(body["requestId"], "req-1");

    let req = test::TestRequest::get()
        .uri("/api/links/decode?link=%2Fpay%2Fnobody%2F10usdc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_link");
}

#[actix_rt::test]
async fn test_resolve_literal_link() {
    let state = make_state(&[]);
    let app = app!(state);

    let uri = format!("/api/links/resolve?link=%2Fpay%2F{RECIPIENT}%2F10usdc");
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["chainId"], 10);
    assert_eq!(body["chain"], "optimism");
    assert_eq!(body["amount"], serde_json::json!({"kind": "exact", "value": "10"}));
    assert_eq!(body["tokenSymbol"], "USDC");
}

#[actix_rt::test]
async fn test_request_lookup() {
    let state = make_state(&[]);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/requests/req-1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["chain"], "arbitrum");
    assert_eq!(body["tokenSymbol"], "USDC");
    assert_eq!(body["requestId"], "req-1");

    let req = test::TestRequest::get().uri("/api/requests/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_fulfillment_relay() {
    let state = make_state(&[]);
    let app = app!(state);

    let report = serde_json::json!({
        "requestId": "req-1",
        "chainId": 42161,
        "txHash": format!("0x{}", "aa".repeat(32)),
        "payerAddress": format!("0x{}", "42".repeat(20)),
        "link": "https://pay.example.com/pay?id=req-1"
    });

    let req = test::TestRequest::post()
        .uri("/api/requests/other/fulfillment")
        .set_json(&report)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/requests/req-1/fulfillment")
        .set_json(&report)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let reports = state.service.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].payer_address,
        alloy::primitives::Address::repeat_byte(0x42)
    );
}

#[actix_rt::test]
async fn test_metrics_requires_bearer_token() {
    paylink_server::metrics::register_metrics();
    let state = make_state(&[("METRICS_TOKEN", "s3cret")]);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get()
        .uri("/metrics")
        .insert_header(("Authorization", "Bearer s3cret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_ens_lookup_rejects_non_names() {
    let state = make_state(&[("ETH_RPC_URL", "http://localhost:1")]);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/ens/alice").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "bad_request");
}

#[actix_rt::test]
async fn test_ens_lookup_with_unreachable_rpc_is_bad_gateway() {
    let state = make_state(&[("ETH_RPC_URL", "http://localhost:1")]);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/ens/alice.eth").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);
}
