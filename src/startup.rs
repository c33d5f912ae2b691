use std::{net::TcpListener, time::Duration};

use actix_web::{dev::Server, web, App, HttpServer};
use diesel::{r2d2::ConnectionManager, PgConnection};
use r2d2::Pool;
use tracing_actix_web::TracingLogger;

use crate::{
    auth::Tokenizer,
    configuration::{DatabaseSettings, Settings},
    routes::{
        admin, authentication, cart, catalog, health_check, order, payments, profile, vendor, wishlist, ApiError
    },
    security::{AccessPolicy, AdminGuardFactory, RateLimiter},
    utils::DbPool
};

pub struct Application{
    pub host: String,
    pub port: u16,
    pub server: Server
}

impl Application {
    pub async fn new(settings: Settings) -> Result<Self, anyhow::Error>{
        let pool = get_connection_pool(&settings.database);

        let listener = TcpListener::bind((settings.application.host.as_str(), settings.application.port))?;
        let port = listener.local_addr()?.port();

        let server = run(listener, pool, settings.clone())?;

        Ok(Application{
            host: settings.application.host,
            port,
            server
        })
    }
}

/// Connections are opened lazily so the server starts without a database
pub fn get_connection_pool(settings: &DatabaseSettings) -> DbPool{
    Pool::builder()
        .connection_timeout(Duration::from_secs(settings.connection_timeout_secs))
        .build_unchecked(ConnectionManager::<PgConnection>::new(settings.get_database_table_url()))
}

fn bad_request(message: String) -> actix_web::Error{
    ApiError::Validation(message).into()
}

pub fn run(listener: TcpListener, pool: DbPool, settings: Settings) -> Result<Server, anyhow::Error>{
    let pool = web::Data::new(pool);
    let tokenizer = web::Data::new(Tokenizer::new(&settings.jwt));
    let limiter = web::Data::new(RateLimiter::from_settings(&settings.security));
    let policy = web::Data::new(AccessPolicy::from_settings(&settings.security));
    let payment_settings = web::Data::new(settings.payments);
    let order_settings = web::Data::new(settings.orders);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(|e, _| bad_request(e.to_string())))
            .app_data(web::QueryConfig::default().error_handler(|e, _| bad_request(e.to_string())))
            .app_data(web::PathConfig::default().error_handler(|e, _| bad_request(e.to_string())))
            .app_data(pool.clone())
            .app_data(tokenizer.clone())
            .app_data(limiter.clone())
            .app_data(policy.clone())
            .app_data(payment_settings.clone())
            .app_data(order_settings.clone())
            .route("/health", web::get().to(health_check))
            .route("/register", web::post().to(authentication::register))
            .route("/login", web::post().to(authentication::login))
            .route("/logout", web::post().to(authentication::logout))
            .service(
                web::scope("/user")
                    .route("/profile", web::get().to(profile::get_profile))
                    .route("/profile", web::put().to(profile::update_profile_info))
                    .route("/addresses", web::get().to(profile::get_addresses))
                    .route("/addresses", web::post().to(profile::post_address))
                    .route("/addresses/{id}/default", web::put().to(profile::make_default_address))
                    .route("/addresses/{id}", web::delete().to(profile::remove_address))
            )
            .route("/categories", web::get().to(catalog::get_categories))
            .service(
                web::scope("/products")
                    .route("", web::get().to(catalog::get_products))
                    .route("/{id}", web::get().to(catalog::get_product))
                    .route("/{id}/reviews", web::get().to(catalog::get_reviews))
                    .route("/{id}/reviews", web::post().to(catalog::post_review))
                    .route("/{id}/reviews/stats", web::get().to(catalog::get_review_stats))
            )
            .route("/reviews/{id}/helpful", web::post().to(catalog::post_helpful))
            .service(
                web::scope("/orders")
                    .route("", web::post().to(order::post_order))
                    .route("", web::get().to(order::get_orders))
                    .route("/{id}", web::get().to(order::get_order_by_id))
            )
            .service(
                web::scope("/payments")
                    .route("", web::post().to(payments::post_payment))
                    .route("", web::get().to(payments::get_payments))
            )
            .service(
                web::scope("/cart")
                    .route("", web::get().to(cart::get_cart))
                    .route("", web::post().to(cart::post_cart_item))
                    .route("", web::delete().to(cart::delete_cart))
                    .route("/{id}", web::put().to(cart::put_cart_item))
                    .route("/{id}", web::delete().to(cart::delete_cart_item))
            )
            .service(
                web::scope("/wishlist")
                    .route("", web::get().to(wishlist::get_wishlist))
                    .route("", web::post().to(wishlist::post_wishlist))
                    .route("/contains/{product_id}", web::get().to(wishlist::get_wishlist_contains))
                    .route("/{id}", web::delete().to(wishlist::delete_wishlist_item))
            )
            .service(
                web::scope("/vendor")
                    .route("/register", web::post().to(vendor::post_vendor_register))
                    .route("/me", web::get().to(vendor::get_vendor_me))
                    .route("/me", web::put().to(vendor::put_vendor_me))
                    .route("/products", web::get().to(vendor::get_vendor_products))
                    .route("/products", web::post().to(vendor::post_vendor_product))
                    .route("/products/{id}", web::put().to(vendor::put_vendor_product))
                    .route("/products/{id}", web::delete().to(vendor::delete_vendor_product))
                    .route("/orders", web::get().to(vendor::get_vendor_orders))
                    .route("/orders/{id}/status", web::put().to(vendor::put_vendor_order_status))
                    .route("/orders/{id}/tracking", web::put().to(vendor::put_vendor_order_tracking))
                    .route("/subscription", web::get().to(vendor::get_subscription))
                    .route("/subscription", web::post().to(vendor::post_subscription))
                    .route("/reviews/{id}/response", web::post().to(vendor::post_review_response))
            )
            // registered ahead of the guarded scope so it stays reachable
            .route("/admin/login", web::post().to(authentication::admin_login))
            .service(
                web::scope("/admin")
                    .wrap(AdminGuardFactory)
                    .route("/dashboard", web::get().to(admin::get_dashboard))
                    .route("/audit-log", web::get().to(admin::get_audit_log))
                    .route("/vendors", web::get().to(admin::get_admin_vendors))
                    .route("/vendors/{id}", web::get().to(admin::get_admin_vendor))
                    .route("/vendors/{id}/approve", web::post().to(admin::post_vendor_approve))
                    .route("/vendors/{id}/reject", web::post().to(admin::post_vendor_reject))
                    .route("/vendors/{id}/suspend", web::post().to(admin::post_vendor_suspend))
                    .route("/users", web::get().to(admin::get_admin_users))
                    .route("/users/{id}/suspend", web::post().to(admin::post_user_suspend))
                    .route("/staff", web::get().to(admin::get_staff))
                    .route("/staff", web::post().to(admin::post_staff))
                    .route("/staff/{id}/permissions", web::put().to(admin::put_staff_permissions))
                    .route("/staff/{id}", web::delete().to(admin::delete_staff))
                    .route("/categories", web::post().to(admin::post_category))
                    .route("/categories/{id}", web::put().to(admin::put_category))
                    .route("/categories/{id}", web::delete().to(admin::delete_category))
                    .route("/products", web::get().to(admin::get_admin_products))
                    .route("/products/{id}", web::put().to(admin::put_admin_product))
                    .route("/orders", web::get().to(admin::get_admin_orders))
                    .route("/orders/{id}/status", web::put().to(admin::put_admin_order_status))
                    .route("/payments", web::get().to(admin::get_admin_payments))
                    .route("/payouts", web::post().to(admin::post_payout))
                    .route("/finance/report", web::get().to(admin::get_finance_report))
                    .route("/reviews", web::get().to(admin::get_admin_reviews))
                    .route("/reviews/{id}/approve", web::post().to(admin::post_review_approve))
                    .route("/reviews/{id}", web::delete().to(admin::delete_admin_review))
                    .route("/security/events", web::get().to(admin::get_security_events))
                    .route("/security/fraud-alerts", web::get().to(admin::get_fraud_alerts))
                    .route("/security/fraud-alerts/{id}/resolve", web::post().to(admin::post_fraud_alert_resolve))
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
