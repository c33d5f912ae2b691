use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::FraudAlertStatus,
    models::{FraudAlert, NewSecurityEvent, SecurityEvent},
    schema::{fraud_alerts, security_events},
    utils::{DbPool, PageQuery}
};

use super::{run_query, QueryError};

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SecurityEventFilters{
    pub event_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct FraudAlertFilters{
    pub status: Option<FraudAlertStatus>
}

/// Stores a security event. Like audit writes, a failure is only logged.
#[tracing::instrument("Recording security event", skip(pool, event), fields(event_type = %event.event_type))]
pub async fn record_event(pool: &DbPool, event: NewSecurityEvent){
    let result = run_query(pool, move |conn| {
        diesel::insert_into(security_events::table)
            .values(&event)
            .execute(conn)?;
        Ok(())
    })
    .await;

    if let Err(e) = result {
        tracing::error!(error = ?e, "Failed to record security event");
    }
}

fn filtered_events(filters: &SecurityEventFilters) -> security_events::BoxedQuery<'static, Pg>{
    let mut query = security_events::table.into_boxed();

    if let Some(event_type) = filters.event_type.clone() {
        query = query.filter(security_events::event_type.eq(event_type));
    }
    if let Some(from) = filters.date_from {
        query = query.filter(security_events::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(security_events::created_at.le(to));
    }

    query
}

#[tracing::instrument("Listing security events", skip(pool))]
pub async fn list_events(pool: &DbPool, filters: SecurityEventFilters, page: PageQuery) -> Result<(Vec<SecurityEvent>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered_events(&filters).count().get_result::<i64>(conn)?;
        let events = filtered_events(&filters)
            .select(SecurityEvent::as_select())
            .order(security_events::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((events, count))
    })
    .await
}

fn filtered_alerts(filters: &FraudAlertFilters) -> fraud_alerts::BoxedQuery<'static, Pg>{
    let mut query = fraud_alerts::table.into_boxed();
    if let Some(status) = filters.status {
        query = query.filter(fraud_alerts::status.eq(status));
    }
    query
}

#[tracing::instrument("Listing fraud alerts", skip(pool))]
pub async fn list_fraud_alerts(pool: &DbPool, filters: FraudAlertFilters, page: PageQuery) -> Result<(Vec<FraudAlert>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered_alerts(&filters).count().get_result::<i64>(conn)?;
        let alerts = filtered_alerts(&filters)
            .select(FraudAlert::as_select())
            .order((fraud_alerts::risk_score.desc(), fraud_alerts::created_at.desc()))
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((alerts, count))
    })
    .await
}

#[tracing::instrument("Resolving fraud alert", skip(pool))]
pub async fn resolve_fraud_alert(pool: &DbPool, alert_id: Uuid, admin_id: Uuid) -> Result<FraudAlert, QueryError>{
    run_query(pool, move |conn| {
        diesel::update(fraud_alerts::table.find(alert_id))
            .set((
                fraud_alerts::status.eq(FraudAlertStatus::Resolved),
                fraud_alerts::resolved_by.eq(admin_id),
                fraud_alerts::resolved_at.eq(Utc::now())
            ))
            .returning(FraudAlert::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("fraud alert"))
    })
    .await
}
