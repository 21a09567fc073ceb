mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{id_of, TestApp};

async fn order_worth_300(app: &TestApp) -> i32 {
    let user_id = app.seed_user("cashier").await;
    let order_id = app.seed_order(user_id).await;
    let catalog = app.seed_catalog().await;
    app.seed_product(order_id, catalog, dec!(100.00)).await;
    app.seed_product(order_id, catalog, dec!(200.00)).await;
    order_id
}

async fn pay(app: &TestApp, voucher_id: i32, amount: &str, date: &str) -> i32 {
    let line = app
        .create(
            &format!("/api/v1/vouchers/{voucher_id}/lines"),
            json!({ "amount": amount, "payment_date": date, "payment_ref": "RCPT-1" }),
        )
        .await;
    id_of(&line)
}

#[tokio::test]
async fn rest_amount_is_orders_total_minus_lines() {
    let app = TestApp::new().await;
    let order_id = order_worth_300(&app).await;

    let voucher = app
        .create(
            "/api/v1/vouchers",
            json!({ "payment_method": "CASH", "order_ids": [order_id] }),
        )
        .await;
    let voucher_id = id_of(&voucher);
    assert_eq!(voucher["orders_total_price"], "300.00");
    assert_eq!(voucher["rest_amount"], "300.00");

    pay(&app, voucher_id, "150.00", "2024-03-01").await;
    pay(&app, voucher_id, "100.00", "2024-04-01").await;

    let balance = app
        .get_data(&format!("/api/v1/vouchers/{voucher_id}/balance"))
        .await;
    assert_eq!(balance["orders_total_price"], "300.00");
    assert_eq!(balance["voucher_lines_total_amount"], "250.00");
    assert_eq!(balance["rest_amount"], "50.00");

    let detail = app
        .get_data(&format!("/api/v1/vouchers/{voucher_id}"))
        .await;
    assert_eq!(detail["rest_amount"], "50.00");
    assert_eq!(detail["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(detail["orders"][0]["order_id"], order_id);
    assert_eq!(detail["orders"][0]["total_price"], "300.00");
}

#[tokio::test]
async fn overpayment_gives_negative_rest() {
    let app = TestApp::new().await;
    let order_id = order_worth_300(&app).await;
    let voucher = app
        .create(
            "/api/v1/vouchers",
            json!({ "payment_method": "CARD", "order_ids": [order_id] }),
        )
        .await;
    let voucher_id = id_of(&voucher);

    pay(&app, voucher_id, "320.00", "2024-03-01").await;

    let balance = app
        .get_data(&format!("/api/v1/vouchers/{voucher_id}/balance"))
        .await;
    assert_eq!(balance["rest_amount"], "-20.00");
}

#[tokio::test]
async fn balance_follows_linked_orders() {
    let app = TestApp::new().await;
    let order_id = order_worth_300(&app).await;
    let voucher = app
        .create("/api/v1/vouchers", json!({ "payment_method": "IGC" }))
        .await;
    let voucher_id = id_of(&voucher);
    assert_eq!(voucher["orders_total_price"], "0.00");

    let (status, linked) = app
        .json(
            Method::POST,
            &format!("/api/v1/vouchers/{voucher_id}/orders"),
            Some(json!({ "order_id": order_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(linked["data"]["orders_total_price"], "300.00");

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/v1/vouchers/{voucher_id}/orders"),
            Some(json!({ "order_id": order_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, unlinked) = app
        .json(
            Method::DELETE,
            &format!("/api/v1/vouchers/{voucher_id}/orders/{order_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unlinked["data"]["orders_total_price"], "0.00");

    let (status, _) = app
        .json(
            Method::DELETE,
            &format!("/api/v1/vouchers/{voucher_id}/orders/{order_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn voucher_with_unknown_order_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/vouchers",
            Some(json!({ "payment_method": "CASH", "order_ids": [404] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["order_ids"].is_array());

    let list = app.get_data("/api/v1/vouchers").await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn non_positive_line_amount_is_rejected() {
    let app = TestApp::new().await;
    let voucher = app
        .create("/api/v1/vouchers", json!({ "payment_method": "CASH" }))
        .await;
    let voucher_id = id_of(&voucher);

    for amount in ["0.00", "-5.00", "10.005"] {
        let (status, body) = app
            .json(
                Method::POST,
                &format!("/api/v1/vouchers/{voucher_id}/lines"),
                Some(json!({ "amount": amount, "payment_date": "2024-03-01" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{amount}");
        assert!(body["field_errors"]["amount"].is_array(), "{amount}");
    }
}

#[tokio::test]
async fn removing_a_line_restores_the_balance() {
    let app = TestApp::new().await;
    let order_id = order_worth_300(&app).await;
    let voucher = app
        .create(
            "/api/v1/vouchers",
            json!({ "payment_method": "CASH", "order_ids": [order_id] }),
        )
        .await;
    let voucher_id = id_of(&voucher);
    let line_id = pay(&app, voucher_id, "150.00", "2024-03-01").await;

    let (status, _) = app
        .json(
            Method::DELETE,
            &format!("/api/v1/vouchers/{voucher_id}/lines/{line_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let balance = app
        .get_data(&format!("/api/v1/vouchers/{voucher_id}/balance"))
        .await;
    assert_eq!(balance["rest_amount"], "300.00");
}

#[tokio::test]
async fn deleting_a_voucher_keeps_its_orders() {
    let app = TestApp::new().await;
    let order_id = order_worth_300(&app).await;
    let voucher = app
        .create(
            "/api/v1/vouchers",
            json!({ "payment_method": "CASH", "order_ids": [order_id] }),
        )
        .await;
    let voucher_id = id_of(&voucher);
    pay(&app, voucher_id, "150.00", "2024-03-01").await;

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/v1/vouchers/{voucher_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let order = app.get_data(&format!("/api/v1/orders/{order_id}")).await;
    assert_eq!(order["total_price"], "300.00");
    assert_eq!(order["voucher_ids"], json!([]));
}

#[tokio::test]
async fn payment_method_can_change_and_filter() {
    let app = TestApp::new().await;
    let voucher = app
        .create("/api/v1/vouchers", json!({ "payment_method": "CASH" }))
        .await;
    let voucher_id = id_of(&voucher);

    let (status, updated) = app
        .json(
            Method::PUT,
            &format!("/api/v1/vouchers/{voucher_id}"),
            Some(json!({ "payment_method": "CARD" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["payment_method"], "CARD");

    let cards = app.get_data("/api/v1/vouchers?payment_method=CARD").await;
    assert_eq!(cards["total"], 1);
    let cash = app.get_data("/api/v1/vouchers?payment_method=CASH").await;
    assert_eq!(cash["total"], 0);
}
