use axum::http::StatusCode;
use axum_test::TestServer;
use menu_relay::store::{OrderLine, StoredMenuItem};
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;
use common::{mocks::MockBackend, test_utils::create_test_app};

async fn create_test_server() -> TestServer {
    let mut backend = MockBackend::new();
    backend.expect_forward().never();
    let (app, _store) = create_test_app(backend).await;
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_create_and_list_menu() {
    let server = create_test_server().await;

    let response = server
        .post("/api/menu")
        .json(&json!({ "name": "Burger", "price": "10", "category": "Main" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: StoredMenuItem = response.json();
    assert_eq!(created.name, "Burger");

    let items: Vec<StoredMenuItem> = server.get("/api/menu").await.json();
    assert_eq!(items, vec![created]);
}

#[tokio::test]
async fn test_create_rejects_blank_price() {
    let server = create_test_server().await;

    let response = server
        .post("/api/menu")
        .json(&json!({ "name": "Burger", "price": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_inferred_menu() {
    let server = create_test_server().await;

    let response = server
        .post("/api/menu/import")
        .json(&json!({
            "menu_items": [
                { "name": "Tea", "price": "2.50" },
                { "name": "Scone", "price": "3.00", "description": "With jam" }
            ]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let items: Vec<StoredMenuItem> = server.get("/api/menu").await.json();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].description.as_deref(), Some("With jam"));
}

#[tokio::test]
async fn test_delete_menu_item() {
    let server = create_test_server().await;
    let created: StoredMenuItem = server
        .post("/api/menu")
        .json(&json!({ "name": "Pizza", "price": "12" }))
        .await
        .json();

    server
        .delete(&format!("/api/menu/{}", created.id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&format!("/api/menu/{}", created.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_team_order_flow() {
    let server = create_test_server().await;
    let salad: StoredMenuItem = server
        .post("/api/menu")
        .json(&json!({ "name": "Salad", "price": "8" }))
        .await
        .json();

    for member in ["ana", "ben"] {
        server
            .post("/api/orders/selections")
            .json(&json!({ "member": member, "item_id": salad.id }))
            .await
            .assert_status(StatusCode::CREATED);
    }
    server
        .delete("/api/orders/selections")
        .json(&json!({ "member": "ben", "item_id": salad.id }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let summary: Vec<OrderLine> = server.get("/api/orders").await.json();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].quantity, 1);
    assert_eq!(summary[0].members, vec!["ana"]);

    server
        .delete("/api/orders")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let summary: Vec<OrderLine> = server.get("/api/orders").await.json();
    assert!(summary.is_empty());
}

#[tokio::test]
async fn test_selecting_unknown_item_is_not_found() {
    let server = create_test_server().await;

    server
        .post("/api/orders/selections")
        .json(&json!({ "member": "ana", "item_id": "nope" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
