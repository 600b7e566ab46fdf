mod common;

use assert_matches::assert_matches;
use common::{stock_ok, stock_short, TestBackend};
use comercia_fulfillment::errors::ServiceError;
use comercia_fulfillment::models::cart::SelectionLine;
use comercia_fulfillment::services::pipeline::SubmissionWarning;
use comercia_fulfillment::services::submission::{OrderSubmission, PaymentInstruction};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn monitor_line(product_id: Uuid, quantity: i32) -> SelectionLine {
    SelectionLine {
        product_id,
        name: "Monitor".to_string(),
        sku: Some("MON-24".to_string()),
        unit_price: dec!(150.00),
        quantity,
        known_stock: Some(10),
    }
}

fn submission(company_id: Uuid, line: SelectionLine) -> OrderSubmission {
    OrderSubmission {
        company_id: Some(company_id),
        items: vec![line],
        ..OrderSubmission::default()
    }
}

#[tokio::test]
async fn happy_path_creates_confirms_and_attaches_invoice() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_ok(product_id, 10)))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-100", "status": "received" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/confirm")))
        .and(body_json(json!({
            "paid": true,
            "amount": "200.00",
            "paymentMethod": "cash"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "orderCode": "PED-100",
                "status": "received",
                "companyId": company_id,
                "items": [
                    { "productId": product_id, "quantity": 2, "unitPrice": "150.00", "name": "Monitor" }
                ]
            }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "invoiceUrl": "https://files.comercia.test/factura-PED-100.pdf",
                "invoiceFilename": "factura-PED-100.pdf"
            }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let mut input = submission(company_id, monitor_line(product_id, 2));
    input.payment = Some(PaymentInstruction {
        amount: dec!(200.00),
        method: Some(comercia_fulfillment::models::order::PaymentMethod::Cash),
    });

    let report = backend.client.submission.submit(input).await.unwrap();

    assert!(report.is_clean(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.order_id, Some(order_id));
    assert_eq!(report.order_code.as_deref(), Some("PED-100"));
    let invoice = report.invoice.expect("invoice should be attached");
    assert_eq!(invoice.filename, "factura-PED-100.pdf");
}

#[tokio::test]
async fn stock_shortfall_blocks_before_any_write() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_short(product_id, 3)))
        .expect(1)
        .mount(&backend.server)
        .await;

    // The order write must never happen.
    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(0)
        .mount(&backend.server)
        .await;

    let err = backend
        .client
        .submission
        .submit(submission(Uuid::new_v4(), monitor_line(product_id, 5)))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(message) => {
        assert!(message.contains("Monitor"));
        assert!(message.contains('5'));
        assert!(message.contains('3'));
    });
}

#[tokio::test]
async fn missing_id_resolves_through_order_code_lookup() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();
    let resolved_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_ok(product_id, 10)))
        .mount(&backend.server)
        .await;

    // Create succeeds but the response carries no usable id.
    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "orderCode": "PED-77" }
        })))
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/client-orders"))
        .and(query_param("search", "PED-77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": resolved_id, "orderCode": "PED-77", "status": "received" }
            ],
            "meta": { "page": 1, "totalPages": 1 }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{resolved_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": resolved_id, "orderCode": "PED-77", "status": "received" }
        })))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{resolved_id}/invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": resolved_id, "invoiceUrl": "u", "invoiceFilename": "factura-PED-77.pdf" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let report = backend
        .client
        .submission
        .submit(submission(Uuid::new_v4(), monitor_line(product_id, 2)))
        .await
        .unwrap();

    assert_eq!(report.order_id, Some(resolved_id));
    assert!(report.is_clean());
}

#[tokio::test]
async fn unresolvable_id_degrades_without_failing_the_order() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_ok(product_id, 10)))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "orderCode": "PED-404" }
        })))
        .mount(&backend.server)
        .await;

    // The code lookup finds nothing.
    Mock::given(method("GET"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "meta": { "page": 1, "totalPages": 1 }
        })))
        .mount(&backend.server)
        .await;

    let report = backend
        .client
        .submission
        .submit(submission(Uuid::new_v4(), monitor_line(product_id, 1)))
        .await
        .expect("an unresolved id must not fail the submission");

    assert_eq!(report.order_id, None);
    assert_eq!(report.order_code.as_deref(), Some("PED-404"));
    assert!(report.invoice.is_none());
    assert_matches!(
        report.warnings.as_slice(),
        [SubmissionWarning::IdentifierUnresolved { .. }]
    );
}

#[tokio::test]
async fn zero_amount_confirms_as_debt() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_ok(product_id, 10)))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-1" }
        })))
        .mount(&backend.server)
        .await;

    // Exactly {paid: false}: no amount, no method.
    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/confirm")))
        .and(body_json(json!({ "paid": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-1", "invoiceUrl": "u", "invoiceFilename": "f" }
        })))
        .mount(&backend.server)
        .await;

    let mut input = submission(Uuid::new_v4(), monitor_line(product_id, 1));
    input.payment = Some(PaymentInstruction {
        amount: dec!(0),
        method: Some(comercia_fulfillment::models::order::PaymentMethod::Card),
    });

    let report = backend.client.submission.submit(input).await.unwrap();
    assert!(report.is_clean());
}

#[tokio::test]
async fn unreachable_stock_check_proceeds_with_warning() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-2", "invoiceUrl": "u", "invoiceFilename": "f" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-2", "invoiceUrl": "u", "invoiceFilename": "f" }
        })))
        .mount(&backend.server)
        .await;

    let report = backend
        .client
        .submission
        .submit(submission(Uuid::new_v4(), monitor_line(product_id, 1)))
        .await
        .unwrap();

    assert_matches!(
        report.warnings.as_slice(),
        [SubmissionWarning::StockUnverified(_)]
    );
    assert_eq!(report.order_id, Some(order_id));
}

#[tokio::test]
async fn confirm_failure_is_non_fatal_and_later_stages_still_run() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_ok(product_id, 10)))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-3" }
        })))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/confirm")))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-3" }
        })))
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "invoiceUrl": "u", "invoiceFilename": "factura-PED-3.pdf" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let mut input = submission(Uuid::new_v4(), monitor_line(product_id, 1));
    input.payment = Some(PaymentInstruction {
        amount: dec!(50),
        method: None,
    });

    let report = backend.client.submission.submit(input).await.unwrap();

    assert_matches!(
        report.warnings.as_slice(),
        [SubmissionWarning::PaymentConfirmation(_)]
    );
    assert!(report.invoice.is_some(), "invoice still attached after confirm failure");
}

#[tokio::test]
async fn editing_an_existing_order_uses_the_update_path() {
    let backend = TestBackend::start().await;
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stock_ok(product_id, 10)))
        .mount(&backend.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-8", "status": "received" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    // No create on the edit path.
    Mock::given(method("POST"))
        .and(path("/client-orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(0)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-8", "invoiceUrl": "u", "invoiceFilename": "f" }
        })))
        .mount(&backend.server)
        .await;

    let mut input = submission(Uuid::new_v4(), monitor_line(product_id, 2));
    input.existing_order_id = Some(order_id);

    let report = backend.client.submission.submit(input).await.unwrap();
    assert_eq!(report.order_id, Some(order_id));
    assert!(report.is_clean());
}

#[tokio::test]
async fn preflight_failures_never_touch_the_network() {
    let backend = TestBackend::start().await;

    // Any request at all would be an unmatched 404 + expectation failure.
    Mock::given(method("POST"))
        .and(path("/products/check-stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&backend.server)
        .await;

    let err = backend
        .client
        .submission
        .submit(OrderSubmission::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
