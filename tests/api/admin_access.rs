use bazaar::auth::UserRole;
use serde_json::json;

use crate::helpers::TestApp;

#[actix_web::test]
async fn admin_routes_require_a_token_outside_production(){
    let app = TestApp::spawn_app().await;

    let response = app.get("/admin/dashboard", None).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn unlisted_ip_is_turned_away_even_with_a_forwarded_header(){
    let app = TestApp::spawn_with(|settings| settings.security.allowed_ips = vec!["10.0.0.1".into()]).await;
    let token = app.token_for(UserRole::SuperAdmin);

    let response = app.get("/admin/dashboard", Some(&token)).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.api_client
        .get(format!("{}/admin/dashboard", app.get_app_url()))
        .bearer_auth(&token)
        .header("X-Forwarded-For", "10.0.0.1")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);
}

#[actix_web::test]
async fn trusted_proxy_can_vouch_for_a_listed_ip(){
    let app = TestApp::spawn_with(|settings| {
        settings.security.allowed_ips = vec!["10.0.0.1".into()];
        settings.security.trusted_proxies = vec!["127.0.0.1".into()];
    })
    .await;

    let response = app.api_client
        .get(format!("{}/admin/dashboard", app.get_app_url()))
        .header("X-Forwarded-For", "10.0.0.1")
        .send()
        .await
        .expect("Failed to execute request");
    // past the network guard, stopped by the missing token
    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn production_without_allowlists_denies_the_portal_but_not_admin_login(){
    let app = TestApp::spawn_with(|settings| {
        settings.security.production = true;
        settings.security.allowed_ips = Vec::new();
        settings.security.allowed_domains = Vec::new();
    })
    .await;

    let response = app.get("/admin/audit-log", Some(&app.token_for(UserRole::SuperAdmin))).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.post_json("/admin/login", &json!({ "email": "nope", "password": "market2024" }), None).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn non_admin_tokens_are_forbidden(){
    let app = TestApp::spawn_app().await;

    for role in [UserRole::Buyer, UserRole::Vendor] {
        let response = app.get("/admin/vendors", Some(&app.token_for(role))).await;
        assert_eq!(response.status().as_u16(), 403, "{:?} reached an admin route", role);
    }
}

#[actix_web::test]
async fn staff_management_needs_a_super_admin(){
    let app = TestApp::spawn_app().await;
    let token = app.token_for(UserRole::Admin);

    let response = app.get("/admin/staff", Some(&token)).await;
    assert_eq!(response.status().as_u16(), 403);

    let body = json!({ "email": "staff@example.com", "full_name": "Staff", "role": "moderator", "permissions": [] });
    let response = app.post_json("/admin/staff", &body, Some(&token)).await;
    assert_eq!(response.status().as_u16(), 403);
}
