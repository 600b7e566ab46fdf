mod common;

use common::{stock_ok, TestBackend};
use comercia_fulfillment::models::order::{Order, OrderItem, OrderStatus};
use comercia_fulfillment::models::cart::SelectionLine;
use comercia_fulfillment::services::submission::OrderSubmission;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn order_with_items(order_id: Uuid, status: OrderStatus, invoice_url: Option<&str>) -> Order {
    Order {
        id: Some(order_id),
        order_code: Some("PED-55".to_string()),
        status,
        items: vec![OrderItem {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: dec!(75.00),
            name: Some("Teclado".to_string()),
            sku: None,
        }],
        invoice_url: invoice_url.map(|u| u.to_string()),
        ..Order::default()
    }
}

#[tokio::test]
async fn reaching_sent_without_invoice_generates_exactly_one() {
    let backend = TestBackend::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/client-orders/{order_id}/status")))
        .and(body_json(json!({ "status": "sent" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-55", "status": "sent" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "invoiceUrl": "https://files.comercia.test/factura-PED-55.pdf",
                "invoiceFilename": "factura-PED-55.pdf"
            }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let order = order_with_items(order_id, OrderStatus::InProcess, None);
    let change = backend
        .client
        .status
        .set_status(&order, OrderStatus::Sent)
        .await
        .unwrap();

    assert_eq!(change.previous, OrderStatus::InProcess);
    assert_eq!(change.order.status, OrderStatus::Sent);
    let invoice = change.invoice.expect("auto-invoice should fire");
    assert_eq!(invoice.filename, "factura-PED-55.pdf");
    assert!(change.invoice_warning.is_none());
}

#[tokio::test]
async fn reaching_sent_with_existing_invoice_generates_none() {
    let backend = TestBackend::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/client-orders/{order_id}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "status": "sent",
                "invoiceUrl": "https://files.comercia.test/old.pdf"
            }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let order = order_with_items(order_id, OrderStatus::InProcess, Some("https://files.comercia.test/old.pdf"));
    let change = backend
        .client
        .status
        .set_status(&order, OrderStatus::Sent)
        .await
        .unwrap();

    assert!(change.invoice.is_none());
    assert!(change.invoice_warning.is_none());
}

#[tokio::test]
async fn invoice_failure_does_not_roll_back_the_status() {
    let backend = TestBackend::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/client-orders/{order_id}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "status": "sent" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&backend.server)
        .await;

    let order = order_with_items(order_id, OrderStatus::Received, None);
    let change = backend
        .client
        .status
        .set_status(&order, OrderStatus::Sent)
        .await
        .expect("status change itself must stand");

    assert_eq!(change.order.status, OrderStatus::Sent);
    assert!(change.invoice.is_none());
    assert!(change.invoice_warning.is_some());
}

#[tokio::test]
async fn regenerate_replaces_the_attachment() {
    let backend = TestBackend::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "orderCode": "PED-55",
                "status": "sent",
                "invoiceUrl": "https://files.comercia.test/stale.pdf",
                "invoiceFilename": "factura-PED-55.pdf",
                "items": [
                    { "productId": Uuid::new_v4(), "quantity": 1, "unitPrice": "10.00", "name": "Ratón" }
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
                "invoiceUrl": "https://files.comercia.test/fresh.pdf",
                "invoiceFilename": "factura-PED-55.pdf"
            }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let attachment = backend.client.attachments.regenerate(order_id).await.unwrap();
    assert_eq!(
        attachment.url.as_deref(),
        Some("https://files.comercia.test/fresh.pdf")
    );
}

#[tokio::test]
async fn delete_clears_the_attachment() {
    let backend = TestBackend::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend.server)
        .await;

    backend.client.attachments.delete(order_id).await.unwrap();
}

#[tokio::test]
async fn submission_marked_as_sent_uploads_exactly_one_invoice() {
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
            "data": { "id": order_id, "orderCode": "PED-9", "status": "received" }
        })))
        .mount(&backend.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/client-orders/{order_id}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": order_id, "orderCode": "PED-9", "status": "sent" }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    // One upload total, fired by the status transition; the invoice stage
    // must not add a second.
    Mock::given(method("POST"))
        .and(path(format!("/client-orders/{order_id}/invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "invoiceUrl": "https://files.comercia.test/factura-PED-9.pdf",
                "invoiceFilename": "factura-PED-9.pdf"
            }
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/client-orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": order_id,
                "orderCode": "PED-9",
                "status": "sent",
                "invoiceUrl": "https://files.comercia.test/factura-PED-9.pdf",
                "invoiceFilename": "factura-PED-9.pdf"
            }
        })))
        .mount(&backend.server)
        .await;

    let input = OrderSubmission {
        company_id: Some(Uuid::new_v4()),
        items: vec![SelectionLine {
            product_id,
            name: "Monitor".to_string(),
            sku: None,
            unit_price: dec!(150.00),
            quantity: 1,
            known_stock: Some(10),
        }],
        mark_as_sent: true,
        ..OrderSubmission::default()
    };

    let report = backend.client.submission.submit(input).await.unwrap();
    assert!(report.is_clean(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(
        report.order.as_ref().map(|o| o.status),
        Some(OrderStatus::Sent)
    );
    assert!(report.invoice.is_some());
}
