use std::time::Duration;

use comercia_fulfillment::api::ApiClient;
use comercia_fulfillment::FulfillmentClient;
use serde_json::json;
use uuid::Uuid;
use wiremock::MockServer;

/// Mock backend plus a fully wired client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub client: FulfillmentClient,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let api = ApiClient::from_parts(&server.uri(), None, Duration::from_secs(5))
            .expect("mock server uri is a valid base url");
        let client = FulfillmentClient::from_api(api, 20, 3);
        Self { server, client }
    }
}

/// Stock-check response where the requested line is available.
#[allow(dead_code)]
pub fn stock_ok(product_id: Uuid, available: i32) -> serde_json::Value {
    json!([{ "productId": product_id, "sufficient": true, "available": available }])
}

/// Stock-check response with a shortfall.
#[allow(dead_code)]
pub fn stock_short(product_id: Uuid, available: i32) -> serde_json::Value {
    json!([{ "productId": product_id, "sufficient": false, "available": available }])
}
