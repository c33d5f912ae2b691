use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::IsUser,
    configuration::PaymentSettings,
    db_interaction::payments::{initiate_payment, list_payments, PaymentFilters},
    domain::PaymentMethod,
    routes::ApiError,
    utils::{DbPool, Page, PageQuery}
};

#[derive(Deserialize, Debug)]
pub struct PaymentBody{
    pub order_id: Uuid,
    pub payment_method: PaymentMethod
}

#[tracing::instrument(
    "Initiating payment",
    skip(pool, settings, user),
    fields(buyer_id = %user.0)
)]
pub async fn post_payment(
    pool: web::Data<DbPool>,
    settings: web::Data<PaymentSettings>,
    user: IsUser,
    body: web::Json<PaymentBody>
) -> Result<HttpResponse, ApiError>{
    if !settings.is_enabled(body.payment_method) {
        return Err(ApiError::Validation(format!("Payment method {} is not available", body.payment_method)));
    }

    let payment = initiate_payment(&pool, user.0, body.order_id, body.payment_method).await?;
    Ok(HttpResponse::Created().json(payment))
}

#[tracing::instrument("Listing own payments", skip(pool, user))]
pub async fn get_payments(
    pool: web::Data<DbPool>,
    page: web::Query<PageQuery>,
    user: IsUser
) -> Result<HttpResponse, ApiError>{
    let filters = PaymentFilters{ buyer_id: Some(user.0), ..Default::default() };
    let (payments, count) = list_payments(&pool, filters, *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(payments, count, &page)))
}
