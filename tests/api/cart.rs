use bazaar::auth::UserRole;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::TestApp;

#[actix_web::test]
async fn cart_requires_authentication(){
    let app = TestApp::spawn_app().await;

    let response = app.get("/cart", None).await;
    assert_eq!(response.status().as_u16(), 401);

    let body = json!({ "product_id": Uuid::new_v4(), "quantity": 1 });
    let response = app.post_json("/cart", &body, None).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn adding_an_out_of_range_quantity_is_rejected(){
    let app = TestApp::spawn_app().await;
    let token = app.token_for(UserRole::Buyer);

    for quantity in [0, -3, 10_001] {
        let body = json!({ "product_id": Uuid::new_v4(), "variant_id": null, "quantity": quantity });
        let response = app.post_json("/cart", &body, Some(&token)).await;

        assert_eq!(response.status().as_u16(), 400, "quantity {} was accepted", quantity);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[actix_web::test]
async fn malformed_cart_payload_is_a_json_400(){
    let app = TestApp::spawn_app().await;
    let token = app.token_for(UserRole::Buyer);

    let response = app.post_json("/cart", &json!({ "product_id": "nope" }), Some(&token)).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[actix_web::test]
async fn cart_item_path_must_be_a_uuid(){
    let app = TestApp::spawn_app().await;
    let token = app.token_for(UserRole::Buyer);

    let response = app.api_client
        .put(format!("{}/cart/not-a-uuid", app.get_app_url()))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}
