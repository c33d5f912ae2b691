use std::{sync::Arc, time::Duration};

use bazaar::{
    client::{BackendAvailability, CartOutcome, CartSession, Catalog, Credentials, HttpCartClient, MemoryStorage},
    domain::Quantity
};
use fake::{faker::{internet::en::SafeEmail, name::en::Name}, Fake};
use secrecy::SecretString;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::helpers::TestApp;

async fn register(app: &TestApp) -> (Uuid, String){
    let email: String = SafeEmail().fake();
    let name: String = Name().fake();
    let body = json!({ "email": email, "password": "market2024", "full_name": name });

    let response = app.post_json("/register", &body, None).await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    let id = body["profile"]["id"].as_str().unwrap().parse().unwrap();
    (id, body["token"].as_str().unwrap().to_string())
}

async fn vendor_with_product(app: &TestApp) -> Uuid{
    let (_, token) = register(app).await;

    let response = app.post_json(
        "/vendor/register",
        &json!({ "business_name": "Corner Shop", "email": "shop@example.com" }),
        Some(&token)
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let vendor_token = body["token"].as_str().unwrap().to_string();

    let response = app.post_json(
        "/vendor/products",
        &json!({ "name": "Clay mug", "description": "Hand thrown", "price": "1250.00", "stock": 40 }),
        Some(&vendor_token)
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let product: Value = response.json().await.unwrap();
    product["id"].as_str().unwrap().parse().unwrap()
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn registered_vendor_product_is_listed(){
    let app = TestApp::spawn_app_with_db().await;
    let product_id = vendor_with_product(&app).await;

    let response = app.get(&format!("/products/{}", product_id), None).await;
    assert_eq!(response.status().as_u16(), 200);

    let product: Value = response.json().await.unwrap();
    assert_eq!(product["name"], "Clay mug");
    assert_eq!(product["price"], "1250.00");
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn guest_cart_moves_to_the_server_on_login(){
    let app = TestApp::spawn_app_with_db().await;
    let product_id = vendor_with_product(&app).await;
    let (buyer_id, token) = register(&app).await;

    let remote = HttpCartClient::new(app.get_app_url(), Duration::from_secs(5)).unwrap();
    let storage = Arc::new(MemoryStorage::new());
    let mut session = CartSession::new(storage, remote, Catalog::default(), BackendAvailability::new());

    let outcome = session.add_to_cart(product_id, None, Quantity::parse(2).unwrap()).await;
    assert_eq!(outcome, CartOutcome::SavedLocally);
    assert_eq!(session.item_count(), 2);

    let report = session
        .login(Credentials{ user_id: buyer_id, token: SecretString::from(token.clone()) })
        .await;
    assert_eq!(report.migrated, 1);
    assert_eq!(report.requeued, 0);
    assert_eq!(session.item_count(), 2);

    let response = app.get("/cart", Some(&token)).await;
    assert_eq!(response.status().as_u16(), 200);
    let items: Vec<Value> = response.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);

    assert_eq!(session.clear_cart().await, CartOutcome::Synced);
    let items: Vec<Value> = app.get("/cart", Some(&token)).await.json().await.unwrap();
    assert!(items.is_empty());
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn admin_routes_reject_buyers_with_real_accounts(){
    let app = TestApp::spawn_app_with_db().await;
    let (_, token) = register(&app).await;

    let response = app.get("/admin/dashboard", Some(&token)).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.post_json(
        "/admin/login",
        &json!({ "email": "nobody@example.com", "password": "market2024" }),
        None
    )
    .await;
    assert_eq!(response.status().as_u16(), 401);
}
