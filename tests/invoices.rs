mod support;

use chrono::{Datelike, Utc};
use http::{Method, StatusCode};
use projectdesk_backend::auth::roles::Role;
use projectdesk_backend::database::order_repository::{Order, OrderStatus};
use serde_json::{json, Value};
use std::sync::Arc;
use support::{FakeInvoicing, TestApp};

fn seed(app: &TestApp) -> Order {
    app.store.seed_profile("admin-1", Role::Admin, Some("admin@example.test"));
    app.store.seed_profile("cust-1", Role::Customer, Some("cust@example.test"));
    app.store.seed_order("cust-1", OrderStatus::Processing, 3500.0)
}

fn invoice_body(order_id: &str) -> Value {
    json!({
        "order_id": order_id,
        "line_items": [
            { "description": "Raspberry Pi 4 kit", "quantity": 2, "rate": 1500, "tax_rate": 18 },
            { "description": "Assembly", "quantity": 1, "rate": 500 }
        ],
        "discount": 100,
        "notes": "Thanks for your order"
    })
}

async fn create(app: &TestApp, order_id: &str) -> (StatusCode, Value) {
    app.request(Method::POST, "/api/invoices", Some("admin-1"), Some(invoice_body(order_id)))
        .await
}

#[tokio::test]
async fn test_create_prices_and_numbers_invoice() {
    let app = TestApp::new();
    let order = seed(&app);

    let (status, invoice) = create(&app, &order.id).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["subtotal"], json!(3500.0));
    assert_eq!(invoice["tax_total"], json!(540.0));
    assert_eq!(invoice["discount"], json!(100.0));
    assert_eq!(invoice["total"], json!(3940.0));
    assert_eq!(invoice["status"], json!("draft"));
    assert_eq!(invoice["user_id"], json!("cust-1"));
    assert!(invoice["external_id"].is_null());

    let year = Utc::now().year();
    assert_eq!(invoice["invoice_number"], json!(format!("INV-{}-0001", year)));

    let (_, second) = create(&app, &order.id).await;
    assert_eq!(second["invoice_number"], json!(format!("INV-{}-0002", year)));

    assert_eq!(app.store.notifications_for("cust-1").len(), 2);
}

#[tokio::test]
async fn test_numbering_continues_past_four_digits() {
    let app = TestApp::new();
    let order = seed(&app);
    let year = Utc::now().year();

    let (_, first) = create(&app, &order.id).await;
    app.store.invoices.lock().unwrap()[0].invoice_number = format!("INV-{}-9999", year);
    assert_eq!(first["invoice_number"], json!(format!("INV-{}-0001", year)));

    let (status, widened) = create(&app, &order.id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(widened["invoice_number"], json!(format!("INV-{}-10000", year)));

    let (status, next) = create(&app, &order.id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(next["invoice_number"], json!(format!("INV-{}-10001", year)));
}

#[tokio::test]
async fn test_create_rejects_bad_lines_and_unknown_order() {
    let app = TestApp::new();
    let order = seed(&app);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/invoices",
            Some("admin-1"),
            Some(json!({ "order_id": order.id, "line_items": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create(&app, "no-such-order").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.store.invoices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_copy_is_created_and_kept_in_step() {
    let remote = Arc::new(FakeInvoicing::default());
    let app = TestApp::with_remote(remote.clone());
    let order = seed(&app);

    let (status, invoice) = create(&app, &order.id).await;
    assert_eq!(status, StatusCode::CREATED);
    let number = invoice["invoice_number"].as_str().unwrap();
    assert_eq!(invoice["external_id"], json!(format!("ext-{}", number)));

    let uri = format!("/api/invoices/{}", invoice["id"].as_str().unwrap());
    let (status, body) = app
        .request(Method::PUT, &uri, Some("admin-1"), Some(json!({ "status": "paid" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("paid"));

    assert_eq!(remote.calls(), vec!["create", "update", "mark_paid"]);
}

#[tokio::test]
async fn test_remote_status_is_pulled_on_read() {
    let remote = Arc::new(FakeInvoicing::default());
    let app = TestApp::with_remote(remote.clone());
    let order = seed(&app);

    let (_, invoice) = create(&app, &order.id).await;
    let uri = format!("/api/invoices/{}", invoice["id"].as_str().unwrap());

    let (status, body) = app.request(Method::GET, &uri, Some("cust-1"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("sent"));
    assert_eq!(app.store.invoices.lock().unwrap()[0].status, "sent");
}

#[tokio::test]
async fn test_remote_failures_never_fail_local_writes() {
    let remote = Arc::new(FakeInvoicing::failing());
    let app = TestApp::with_remote(remote.clone());
    let order = seed(&app);

    let (status, invoice) = create(&app, &order.id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(invoice["external_id"].is_null());
    let uri = format!("/api/invoices/{}", invoice["id"].as_str().unwrap());

    let (status, body) = app
        .request(Method::PUT, &uri, Some("admin-1"), Some(json!({ "discount": 0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(4040.0));

    let (status, body) = app
        .request(Method::POST, &format!("{}/send", uri), Some("admin-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("sent"));

    let (status, body) = app.request(Method::GET, &uri, Some("cust-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("sent"));

    assert_eq!(remote.calls(), vec!["create"]);
}

#[tokio::test]
async fn test_pdf_needs_a_remote_copy() {
    let app = TestApp::new();
    let order = seed(&app);
    let (_, invoice) = create(&app, &order.id).await;
    let uri = format!("/api/invoices/{}/pdf", invoice["id"].as_str().unwrap());

    let (status, _) = app.request(Method::GET, &uri, Some("cust-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let remote = Arc::new(FakeInvoicing::default());
    let app = TestApp::with_remote(remote.clone());
    let order = seed(&app);
    let (_, invoice) = create(&app, &order.id).await;
    let uri = format!("/api/invoices/{}/pdf", invoice["id"].as_str().unwrap());

    let (status, _) = app.request(Method::GET, &uri, Some("cust-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(remote.calls().contains(&"pdf".to_string()));
}

#[tokio::test]
async fn test_customers_only_see_their_own_invoices() {
    let app = TestApp::new();
    let order = seed(&app);
    let foreign = app.store.seed_order("cust-2", OrderStatus::Processing, 900.0);
    let (_, own) = create(&app, &order.id).await;
    let (_, other) = create(&app, &foreign.id).await;

    let (status, body) = app.request(Method::GET, "/api/invoices", Some("cust-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], own["id"]);

    let (status, _) = app
        .request(
            Method::GET,
            &format!("/api/invoices/{}", other["id"].as_str().unwrap()),
            Some("cust-1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::POST, "/api/invoices", Some("cust-1"), Some(invoice_body(&order.id)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/invoices/{}", own["id"].as_str().unwrap()),
            Some("admin-1"),
            Some(json!({ "invoice_number": "INV-1999-0001" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
