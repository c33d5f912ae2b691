use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError},
    http::header::USER_AGENT,
    web
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::{db_interaction::security::record_event, models::NewSecurityEvent, utils::DbPool};

use super::{is_suspicious_user_agent, request_client_ip, request_host, AccessPolicy};

/// Wraps the admin scope: requests must pass the [`AccessPolicy`] stored in
/// app data. Denials and suspicious user agents are recorded as security
/// events when a database pool is available.
pub struct AdminGuardFactory;

impl<S> Transform<S, ServiceRequest> for AdminGuardFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = actix_web::Error>,
    S::Future: 'static
{
    type Response = ServiceResponse;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AdminGuard<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGuard{service}))
    }
}

pub struct AdminGuard<S>{
    service: S
}

fn spawn_event_record(req: &ServiceRequest, event: NewSecurityEvent){
    match req.app_data::<web::Data<DbPool>>() {
        Some(pool) => {
            let pool = pool.clone();
            actix_web::rt::spawn(
                async move { record_event(&pool, event).await }
                    .instrument(tracing::Span::current())
            );
        },
        None => tracing::warn!(event_type = %event.event_type, "No database pool, security event not stored")
    }
}

impl<S> Service<ServiceRequest> for AdminGuard<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = actix_web::Error>,
    S::Future: 'static
{
    type Response = S::Response;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    #[tracing::instrument(
        "Checking admin portal access",
        skip(self, req),
        fields(path = %req.path())
    )]
    fn call(&self, req: ServiceRequest) -> Self::Future {
        let current_span = tracing::Span::current();

        let Some(policy) = req.app_data::<web::Data<AccessPolicy>>().cloned() else {
            tracing::error!("Admin access policy is not registered");
            return Box::pin(
                ready(Err(ErrorInternalServerError("Admin access is not configured")))
                    .instrument(current_span)
            )
        };

        let ip = request_client_ip(req.request());
        let host = request_host(req.request());
        let user_agent = req.headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if let Err(denial) = policy.check(ip.as_deref(), &host) {
            tracing::warn!(ip = ?ip, host = %host, reason = denial.reason(), "Admin access denied");
            spawn_event_record(&req, NewSecurityEvent{
                id: Uuid::new_v4(),
                event_type: denial.event_type().to_string(),
                identifier: ip.clone(),
                details: json!({ "host": host, "path": req.path(), "reason": denial.reason() }),
                ip_address: ip,
                user_agent
            });

            return Box::pin(
                ready(Err(ErrorForbidden(denial.reason())))
                    .instrument(current_span)
            )
        }

        if let Some(agent) = user_agent.as_deref().filter(|ua| is_suspicious_user_agent(ua)) {
            tracing::warn!(user_agent = agent, ip = ?ip, "Suspicious user agent on admin portal");
            spawn_event_record(&req, NewSecurityEvent{
                id: Uuid::new_v4(),
                event_type: "suspicious_user_agent".to_string(),
                identifier: ip.clone(),
                details: json!({ "path": req.path() }),
                ip_address: ip,
                user_agent: user_agent.clone()
            });
        }

        let fut = self.service.call(req);

        Box::pin(
            async move {
                let res = fut.await?;
                Ok(res)
            }
            .instrument(current_span)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    use super::AdminGuardFactory;
    use crate::security::AccessPolicy;

    fn policy(ips: &[&str]) -> AccessPolicy{
        AccessPolicy::new(ips.iter().map(|s| s.to_string()).collect(), Vec::new(), true, false)
    }

    fn from(peer: &str) -> test::TestRequest{
        test::TestRequest::get()
            .uri("/admin/ping")
            .peer_addr(peer.parse::<SocketAddr>().unwrap())
    }

    macro_rules! guarded_app {
        ($policy:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($policy))
                    .service(
                        web::scope("/admin")
                            .wrap(AdminGuardFactory)
                            .route("/ping", web::get().to(HttpResponse::Ok))
                    )
            )
            .await
        };
    }

    #[actix_web::test]
    async fn request_from_unlisted_ip_is_forbidden(){
        let app = guarded_app!(policy(&["10.1.1.1"]));

        let err = test::try_call_service(&app, from("10.9.9.9:50000").to_request()).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn request_from_listed_ip_reaches_the_handler(){
        let app = guarded_app!(policy(&["10.1.1.1"]));

        let res = test::call_service(&app, from("10.1.1.1:50000").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn forwarded_for_header_cannot_claim_a_listed_ip(){
        let app = guarded_app!(policy(&["10.1.1.1"]));

        let req = from("10.9.9.9:50000")
            .insert_header(("X-Forwarded-For", "10.1.1.1"))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn trusted_proxy_forwards_the_client_address(){
        let app = guarded_app!(policy(&["10.1.1.1"]).with_trusted_proxies(&["10.0.0.5".into()]));

        let req = from("10.0.0.5:50000")
            .insert_header(("X-Forwarded-For", "10.1.1.1"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
