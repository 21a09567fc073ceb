mod common;

use axum::http::{Method, StatusCode};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use optica_api::entities::{
    contact, frame, identity, institution, lens, order, prescription_detail, product,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

use common::TestApp;

fn payload(user_id: i32) -> Value {
    json!({
        "user_id": user_id,
        "identity": { "first_name": "Ana", "last_name": "Popescu" },
        "contact": { "phone_number": "+40712345678" },
        "institution": { "title": "City Hospital", "address": "12 Main Street" },
        "prescription": {
            "far": {
                "od": { "spheric": "-1.25", "cylindric": "0.50", "axis": 90 },
                "os": { "spheric": "-1.00", "axis": 85 },
                "pupillary_distance": "62.5"
            }
        },
        "product": {
            "frame": { "title": "Ray-Ban Aviator" },
            "glass_type": { "distance": "FAR", "treatment": "POLARIZED" },
            "lens": { "title": "Single vision 1.6 index" },
            "price": "300.00"
        }
    })
}

async fn stored_rows(db: &DatabaseConnection) -> [u64; 6] {
    [
        order::Entity::find().count(db).await.unwrap(),
        identity::Entity::find().count(db).await.unwrap(),
        contact::Entity::find().count(db).await.unwrap(),
        institution::Entity::find().count(db).await.unwrap(),
        prescription_detail::Entity::find().count(db).await.unwrap(),
        product::Entity::find().count(db).await.unwrap(),
    ]
}

#[tokio::test]
async fn submission_opens_a_complete_order() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;

    let receipt = app.create("/api/v1/tunnel", payload(user_id)).await;
    let order_id = receipt["order_id"].as_i64().expect("order id");
    assert_eq!(receipt["reference"], format!("ODR_{order_id:06}"));
    assert_eq!(receipt["total_price"], "300.00");

    let detail = app.get_data(&format!("/api/v1/orders/{order_id}")).await;
    assert_eq!(detail["customer_name"], "Ana Popescu");
    assert_eq!(detail["contact"]["phone_number"], "+40712345678");
    assert_eq!(detail["institution"]["title"], "City Hospital");
    assert_eq!(detail["prescription"]["far"]["os"]["axis"], 85);
    assert_eq!(
        detail["products"][0]["label"],
        "Ray-Ban Aviator - Far, Polarized - Single vision 1.6 index"
    );
    assert_eq!(detail["total_price"], "300.00");

    assert_eq!(stored_rows(&app.state.db).await, [1; 6]);
}

#[tokio::test]
async fn submission_can_reuse_catalog_rows() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let catalog = app.seed_catalog().await;

    let mut body = payload(user_id);
    body["product"]["frame"] = json!({ "id": catalog.frame_id });
    body["product"]["glass_type"] = json!({ "id": catalog.glass_type_id });
    body["product"]["lens"] = json!({ "id": catalog.lens_id });

    let receipt = app.create("/api/v1/tunnel", body).await;
    assert_eq!(receipt["frame_id"], catalog.frame_id);
    assert_eq!(receipt["glass_type_id"], catalog.glass_type_id);
    assert_eq!(receipt["lens_id"], catalog.lens_id);

    let db = &*app.state.db;
    assert_eq!(frame::Entity::find().count(db).await.unwrap(), 1);
    assert_eq!(lens::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_prescription_rejects_the_whole_submission() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;

    let mut body = payload(user_id);
    body["prescription"]["far"]["od"]["axis"] = json!(200);

    let (status, response) = app
        .json(Method::POST, "/api/v1/tunnel", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["field_errors"]["prescription.far.od.axis"].is_array());

    assert_eq!(stored_rows(&app.state.db).await, [0; 6]);
    assert_eq!(frame::Entity::find().count(&*app.state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn wrong_typed_field_gets_an_error_body() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;

    let mut body = payload(user_id);
    body["prescription"]["far"]["od"]["axis"] = json!("ninety");

    let (status, response) = app
        .json(Method::POST, "/api/v1/tunnel", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Bad Request");
    assert!(response["message"].is_string(), "{response}");
    assert!(response["timestamp"].is_string());
    assert_eq!(stored_rows(&app.state.db).await, [0; 6]);
}

#[tokio::test]
async fn catalog_id_mixed_with_new_attributes_is_rejected() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let catalog = app.seed_catalog().await;

    let mut body = payload(user_id);
    body["product"]["frame"] = json!({ "id": catalog.frame_id, "title": "Renamed" });

    let (status, response) = app
        .json(Method::POST, "/api/v1/tunnel", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = response["message"].as_str().unwrap_or_default();
    assert!(message.contains("product.frame"), "{message}");
    assert!(message.contains("`title`"), "{message}");
    assert_eq!(frame::Entity::find().count(&*app.state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn missing_catalog_reference_is_reported_by_path() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;

    let mut body = payload(user_id);
    body["product"]["frame"] = json!({ "id": 9999 });

    let (status, response) = app
        .json(Method::POST, "/api/v1/tunnel", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["field_errors"]["product.frame.id"].is_array());
    assert_eq!(stored_rows(&app.state.db).await, [0; 6]);
}

#[tokio::test]
async fn errors_across_sub_forms_are_reported_together() {
    let app = TestApp::new().await;

    let mut body = payload(4242);
    body["identity"]["first_name"] = json!("");
    body["contact"]["phone_number"] = json!("call me");
    body["product"]["price"] = json!("-10.00");

    let (status, response) = app
        .json(Method::POST, "/api/v1/tunnel", Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in [
        "user_id",
        "identity.first_name",
        "contact.phone_number",
        "product.price",
    ] {
        assert!(
            response["field_errors"][field].is_array(),
            "missing {field}: {response}"
        );
    }
}

#[tokio::test]
async fn every_submission_opens_its_own_order() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;

    let mut names = Vec::new();
    for _ in 0..3 {
        let first_name: String = FirstName().fake();
        let last_name: String = LastName().fake();
        let mut body = payload(user_id);
        body["identity"] = json!({ "first_name": first_name, "last_name": last_name });
        app.create("/api/v1/tunnel", body).await;
        names.push(format!("{first_name} {last_name}"));
    }

    let orders = app
        .get_data(&format!("/api/v1/orders?user_id={user_id}"))
        .await;
    assert_eq!(orders["total"], 3);
    let listed: Vec<&str> = orders["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|item| item["customer_name"].as_str())
        .collect();
    for name in &names {
        assert!(listed.contains(&name.as_str()), "{name} missing from {listed:?}");
    }
}

#[tokio::test]
async fn contact_and_prescription_may_be_omitted() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;

    let mut body = payload(user_id);
    let form = body.as_object_mut().expect("object payload");
    form.remove("contact");
    form.remove("prescription");

    let receipt = app.create("/api/v1/tunnel", body).await;
    let order_id = receipt["order_id"].as_i64().expect("order id");
    let detail = app.get_data(&format!("/api/v1/orders/{order_id}")).await;
    assert!(detail["prescription"]["far"]["od"]["axis"].is_null());
}
