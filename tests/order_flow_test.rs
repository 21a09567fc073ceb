mod common;

use axum::http::{Method, StatusCode};
use optica_api::entities::{contact, identity, institution, prescription_detail, product};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn order_without_products_totals_zero() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;

    let total = app
        .get_data(&format!("/api/v1/orders/{order_id}/total-price"))
        .await;
    assert_eq!(total["total_price"], "0.00");
}

#[tokio::test]
async fn order_total_is_sum_of_product_prices() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let catalog = app.seed_catalog().await;

    app.seed_product(order_id, catalog, dec!(100.00)).await;
    app.seed_product(order_id, catalog, dec!(200.00)).await;

    let total = app
        .get_data(&format!("/api/v1/orders/{order_id}/total-price"))
        .await;
    assert_eq!(total["total_price"], "300.00");

    let detail = app.get_data(&format!("/api/v1/orders/{order_id}")).await;
    assert_eq!(detail["total_price"], "300.00");
    assert_eq!(detail["products"].as_array().map(Vec::len), Some(2));

    let list = app.get_data("/api/v1/orders").await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["total_price"], "300.00");
}

#[tokio::test]
async fn order_detail_carries_display_labels() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let catalog = app.seed_catalog().await;
    app.seed_product(order_id, catalog, dec!(149.99)).await;

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/identity"),
            Some(json!({ "first_name": "Ana", "last_name": "Popescu" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/prescription"),
            Some(json!({ "far": { "od": { "spheric": "-1.25", "axis": 90 } } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let detail = app.get_data(&format!("/api/v1/orders/{order_id}")).await;
    assert_eq!(detail["reference"], format!("ODR_{order_id:06}"));
    assert_eq!(detail["customer_name"], "Ana Popescu");
    assert_eq!(detail["identity"]["full_name"], "Ana Popescu");
    assert_eq!(
        detail["prescription"]["label"],
        format!("Prescription for Order {order_id}")
    );
    assert_eq!(detail["prescription"]["far"]["od"]["spheric"], "-1.25");
    assert_eq!(detail["prescription"]["far"]["od"]["axis"], 90);
    assert!(detail["prescription"]["near"]["od"]["axis"].is_null());
    assert_eq!(
        detail["products"][0]["label"],
        "Ray-Ban Aviator - Far, Polarized - Single vision 1.6 index"
    );
    assert_eq!(detail["products"][0]["price"], "149.99");
}

#[tokio::test]
async fn inline_edit_creates_then_replaces() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let uri = format!("/api/v1/orders/{order_id}/contact");

    let (status, created) = app
        .json(Method::PUT, &uri, Some(json!({ "phone_number": "+40712345678" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, replaced) = app
        .json(Method::PUT, &uri, Some(json!({ "phone_number": "0712345678" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["data"]["id"], created["data"]["id"]);
    assert_eq!(replaced["data"]["phone_number"], "0712345678");

    let (status, _) = app.json(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.json(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_identity_for_an_order_conflicts() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;

    let payload = json!({ "order_id": order_id, "first_name": "Ana", "last_name": "Popescu" });
    app.create("/api/v1/identities", payload.clone()).await;

    let (status, body) = app
        .json(Method::POST, "/api/v1/identities", Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn identity_for_missing_order_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/identities",
            Some(json!({ "order_id": 999, "first_name": "Ana", "last_name": "Popescu" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_an_order_removes_its_records() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let catalog = app.seed_catalog().await;
    app.seed_product(order_id, catalog, dec!(120.00)).await;

    for (path, body) in [
        ("identity", json!({ "first_name": "Ana", "last_name": "Popescu" })),
        ("contact", json!({ "phone_number": "+40712345678" })),
        ("institution", json!({ "title": "City Hospital", "address": "12 Main Street" })),
        ("prescription", json!({})),
    ] {
        let (status, _) = app
            .json(
                Method::PUT,
                &format!("/api/v1/orders/{order_id}/{path}"),
                Some(body),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{path}");
    }

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .json(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let db = &*app.state.db;
    assert_eq!(identity::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(contact::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(institution::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(prescription_detail::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(product::Entity::find().count(db).await.unwrap(), 0);

    // The catalog survives.
    app.get_data(&format!("/api/v1/frames/{}", catalog.frame_id))
        .await;
}

#[tokio::test]
async fn orders_are_searchable_by_reference_and_name() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let first = app.seed_order(user_id).await;
    let second = app.seed_order(user_id).await;

    app.create(
        "/api/v1/identities",
        json!({ "order_id": second, "first_name": "Mihai", "last_name": "Ionescu" }),
    )
    .await;

    let by_reference = app
        .get_data(&format!("/api/v1/orders?search=ODR_{first:06}"))
        .await;
    assert_eq!(by_reference["total"], 1);
    assert_eq!(by_reference["items"][0]["id"], first);

    let by_name = app.get_data("/api/v1/orders?search=Ionescu").await;
    assert_eq!(by_name["total"], 1);
    assert_eq!(by_name["items"][0]["id"], second);
}

#[tokio::test]
async fn orders_list_newest_first_and_latest() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let first = app.seed_order(user_id).await;
    let second = app.seed_order(user_id).await;

    let list = app.get_data("/api/v1/orders").await;
    assert_eq!(list["items"][0]["id"], second);
    assert_eq!(list["items"][1]["id"], first);

    let latest = app.get_data("/api/v1/orders/latest").await;
    assert_eq!(latest["id"], second);
}

#[tokio::test]
async fn summary_requires_an_identity() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let uri = format!("/api/v1/orders/{order_id}/summary");

    let (status, _) = app.json(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.create(
        "/api/v1/identities",
        json!({ "order_id": order_id, "first_name": "Ana", "last_name": "Popescu" }),
    )
    .await;
    let summary = app.get_data(&uri).await;
    assert_eq!(summary["identity"]["full_name"], "Ana Popescu");
    assert_eq!(summary["total_price"], "0.00");
}

#[tokio::test]
async fn change_owner_moves_the_order() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;
    let order_id = app.seed_order(alice).await;

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/owner"),
            Some(json!({ "user_id": bob })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], bob);
    assert_eq!(body["data"]["username"], "bob");

    let for_alice = app
        .get_data(&format!("/api/v1/orders?user_id={alice}"))
        .await;
    assert_eq!(for_alice["total"], 0);
}

#[tokio::test]
async fn order_for_missing_user_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .json(Method::POST, "/api/v1/orders", Some(json!({ "user_id": 42 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.seed_user("frontdesk").await;
    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/users",
            Some(json!({ "username": "frontdesk" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn institutions_list_previews_addresses() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let address = "Strada Lunga 123, Bloc A, Scara 2, Apartament 45, Sector 3, Bucuresti";

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/institution"),
            Some(json!({ "title": "City Hospital", "address": address })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let list = app.get_data("/api/v1/institutions?search=hospital").await;
    assert_eq!(list["total"], 1);
    let preview = list["items"][0]["address_preview"]
        .as_str()
        .expect("preview");
    assert!(preview.ends_with('…'));
    assert_eq!(preview.chars().count(), 51);
}
