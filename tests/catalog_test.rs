mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{id_of, TestApp};

#[tokio::test]
async fn glass_type_defaults_to_near_and_is_labelled() {
    let app = TestApp::new().await;

    let plain = app.create("/api/v1/glass-types", json!({})).await;
    assert_eq!(plain["distance"], "NEAR");
    assert!(plain["treatment"].is_null());
    assert_eq!(plain["label"], "Near");

    let treated = app
        .create(
            "/api/v1/glass-types",
            json!({ "distance": "MEDIUM", "treatment": "ANTI_REFLECTIVE" }),
        )
        .await;
    assert_eq!(treated["label"], "Medium, Anti-Reflective");
}

#[tokio::test]
async fn glass_types_filter_by_distance() {
    let app = TestApp::new().await;
    for distance in ["FAR", "FAR", "NEAR"] {
        app.create("/api/v1/glass-types", json!({ "distance": distance }))
            .await;
    }

    let far = app.get_data("/api/v1/glass-types?distance=FAR").await;
    assert_eq!(far["total"], 2);
    let all = app.get_data("/api/v1/glass-types").await;
    assert_eq!(all["total"], 3);
}

#[tokio::test]
async fn unknown_distance_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/glass-types",
            Some(json!({ "distance": "SIDEWAYS" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"]
        .as_str()
        .is_some_and(|message| message.contains("SIDEWAYS")));
}

#[tokio::test]
async fn blank_frame_title_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(Method::POST, "/api/v1/frames", Some(json!({ "title": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["title"].is_array());
}

#[tokio::test]
async fn frames_can_be_renamed_and_searched() {
    let app = TestApp::new().await;
    let frame = app
        .create("/api/v1/frames", json!({ "title": "Oakley Holbrook" }))
        .await;
    let frame_id = id_of(&frame);
    app.create("/api/v1/frames", json!({ "title": "Lindberg Air" }))
        .await;

    let (status, renamed) = app
        .json(
            Method::PUT,
            &format!("/api/v1/frames/{frame_id}"),
            Some(json!({ "title": "Oakley Frogskins" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["data"]["title"], "Oakley Frogskins");

    let found = app.get_data("/api/v1/frames?search=frogskins").await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["items"][0]["id"], frame_id);
}

#[tokio::test]
async fn referenced_catalog_rows_cannot_be_deleted() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let catalog = app.seed_catalog().await;
    app.seed_product(order_id, catalog, dec!(80.00)).await;

    for uri in [
        format!("/api/v1/frames/{}", catalog.frame_id),
        format!("/api/v1/glass-types/{}", catalog.glass_type_id),
        format!("/api/v1/lenses/{}", catalog.lens_id),
    ] {
        let (status, body) = app.json(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{uri}");
        assert_eq!(body["error"], "Conflict");
        app.get_data(&uri).await;
    }
}

#[tokio::test]
async fn unreferenced_catalog_rows_are_deleted() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    for uri in [
        format!("/api/v1/frames/{}", catalog.frame_id),
        format!("/api/v1/glass-types/{}", catalog.glass_type_id),
        format!("/api/v1/lenses/{}", catalog.lens_id),
    ] {
        let (status, _) = app.json(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT, "{uri}");
        let (status, _) = app.json(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn catalog_rows_become_free_once_products_go() {
    let app = TestApp::new().await;
    let user_id = app.seed_user("frontdesk").await;
    let order_id = app.seed_order(user_id).await;
    let catalog = app.seed_catalog().await;
    let product_id = app.seed_product(order_id, catalog, dec!(80.00)).await;

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/v1/products/{product_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .json(
            Method::DELETE,
            &format!("/api/v1/frames/{}", catalog.frame_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
