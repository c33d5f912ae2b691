use bazaar::auth::UserRole;
use serde_json::json;

use crate::helpers::TestApp;

#[actix_web::test]
async fn register_returns_400_for_invalid_data(){
    let app = TestApp::spawn_app().await;
    let cases = vec![
        (json!({ "email": "not-an-email", "password": "market2024", "full_name": "Ada" }), "invalid email"),
        (json!({ "email": "ada@example.com", "password": "short", "full_name": "Ada" }), "weak password"),
        (json!({ "email": "ada@example.com", "password": "market2024", "full_name": "  " }), "blank name"),
        (json!({ "email": "ada@example.com", "password": "market2024", "full_name": "Ada", "role": "admin" }), "admin role")
    ];

    for (body, description) in cases {
        let response = app.post_json("/register", &body, None).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload had an {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string(), "Missing error message for {}", description);
    }
}

#[actix_web::test]
async fn register_rejects_malformed_json_with_a_json_error(){
    let app = TestApp::spawn_app().await;

    let response = app.api_client
        .post(format!("{}/register", app.get_app_url()))
        .header("Content-Type", "application/json")
        .body("{ \"email\": ")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[actix_web::test]
async fn logout_requires_a_token(){
    let app = TestApp::spawn_app().await;

    let response = app.post_json("/logout", &json!({}), None).await;
    assert_eq!(response.status().as_u16(), 401);

    let token = app.token_for(UserRole::Buyer);
    let response = app.post_json("/logout", &json!({}), Some(&token)).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[actix_web::test]
async fn tampered_token_is_unauthorized(){
    let app = TestApp::spawn_app().await;
    let token = format!("{}x", app.token_for(UserRole::Buyer));

    let response = app.get("/user/profile", Some(&token)).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn buyer_token_cannot_reach_vendor_routes(){
    let app = TestApp::spawn_app().await;
    let token = app.token_for(UserRole::Buyer);

    let response = app.get("/vendor/me", Some(&token)).await;

    assert_eq!(response.status().as_u16(), 403);
}

#[actix_web::test]
async fn repeated_logins_are_rate_limited(){
    let app = TestApp::spawn_with(|settings| settings.security.login_max_attempts = 1).await;
    let body = json!({ "email": "ada@example.com", "password": "market2024" });

    // the first attempt is counted before the (missing) database is consulted
    let first = app.post_json("/login", &body, None).await;
    assert_ne!(first.status().as_u16(), 429);

    let second = app.post_json("/login", &body, None).await;
    assert_eq!(second.status().as_u16(), 429);
    assert!(second.headers().contains_key("Retry-After"));
}
