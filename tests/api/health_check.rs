use crate::helpers::TestApp;

#[actix_web::test]
async fn health_check_reports_ok(){
    let app = TestApp::spawn_app().await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
