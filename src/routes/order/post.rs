use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{IsUser, UserRole},
    configuration::{OrderSettings, PaymentSettings},
    db_interaction::{addresses::list_addresses, orders::{create_orders, Checkout, OrderLine}},
    routes::ApiError,
    utils::DbPool
};

#[derive(Deserialize, Debug)]
pub struct OrderBody{
    pub items: Vec<OrderLine>,
    /// Saved address to ship to; alternatively pass `shipping_address`
    pub address_id: Option<Uuid>,
    pub shipping_address: Option<serde_json::Value>,
    pub notes: Option<String>
}

#[tracing::instrument(
    "Posting order",
    skip(pool, payments, orders, user, body),
    fields(buyer_id = %user.0)
)]
pub async fn post_order(
    pool: web::Data<DbPool>,
    payments: web::Data<PaymentSettings>,
    orders: web::Data<OrderSettings>,
    user: IsUser,
    body: web::Json<OrderBody>
) -> Result<HttpResponse, ApiError>{
    if user.1 != UserRole::Buyer {
        return Err(ApiError::Forbidden("Only buyers can place orders".into()));
    }
    let body = body.into_inner();
    if body.items.is_empty() {
        return Err(ApiError::Validation("An order needs at least one item".into()));
    }

    let shipping_address = match (body.address_id, body.shipping_address) {
        (Some(address_id), _) => {
            let address = list_addresses(&pool, user.0)
                .await?
                .into_iter()
                .find(|a| a.id == address_id)
                .ok_or_else(|| ApiError::NotFound("address not found".into()))?;
            serde_json::to_value(address).map_err(anyhow::Error::from)?
        },
        (None, Some(address)) if address.is_object() => address,
        _ => return Err(ApiError::Validation("A shipping address is required".into()))
    };

    let placed = create_orders(
        &pool,
        Checkout{
            buyer_id: user.0,
            lines: body.items,
            shipping_address,
            notes: body.notes,
            currency: payments.currency.clone(),
            fraud_review_threshold: payments.fraud_review_threshold
        },
        orders.get_ref().clone()
    )
    .await?;

    Ok(HttpResponse::Created().json(placed))
}
