use chrono::Utc;
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{OrderStatus, Rating},
    models::{NewReview, Review},
    schema::{order_items, orders, products, reviews},
    utils::{DbPool, PageQuery}
};

use super::{run_query, QueryError};

#[derive(Debug, Clone)]
pub struct ReviewSubmission{
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub rating: Rating,
    pub title: Option<String>,
    pub comment: Option<String>
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ReviewFilters{
    pub product_id: Option<Uuid>,
    pub is_approved: Option<bool>
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ReviewStats{
    pub average_rating: f64,
    pub total_reviews: usize,
    /// Count per star, index 0 holds one-star reviews
    pub distribution: [usize; 5]
}

impl ReviewStats {
    pub fn from_ratings(ratings: &[i32]) -> Self{
        let mut distribution = [0usize; 5];
        for rating in ratings.iter().filter(|r| (1..=5).contains(*r)) {
            distribution[(*rating - 1) as usize] += 1;
        }

        let total: usize = distribution.iter().sum();
        let average_rating = if total == 0 {
            0.0
        } else {
            let sum: usize = distribution.iter().enumerate().map(|(i, n)| (i + 1) * n).sum();
            (sum as f64 / total as f64 * 100.0).round() / 100.0
        };

        ReviewStats{ average_rating, total_reviews: total, distribution }
    }
}

#[tracing::instrument("Listing approved product reviews", skip(pool))]
pub async fn list_product_reviews(pool: &DbPool, product_id: Uuid, page: PageQuery) -> Result<(Vec<Review>, i64), QueryError>{
    list_reviews(pool, ReviewFilters{ product_id: Some(product_id), is_approved: Some(true) }, page).await
}

#[tracing::instrument("Computing review stats", skip(pool))]
pub async fn review_stats(pool: &DbPool, product_id: Uuid) -> Result<ReviewStats, QueryError>{
    run_query(pool, move |conn| {
        let ratings: Vec<i32> = reviews::table
            .filter(reviews::product_id.eq(product_id))
            .filter(reviews::is_approved.eq(true))
            .select(reviews::rating)
            .load(conn)?;

        Ok(ReviewStats::from_ratings(&ratings))
    })
    .await
}

/// Stores a review awaiting moderation. It counts as a verified purchase when
/// the referenced order is the buyer's, was not cancelled and contains the
/// product.
#[tracing::instrument("Creating review", skip(pool))]
pub async fn create_review(pool: &DbPool, submission: ReviewSubmission) -> Result<Review, QueryError>{
    run_query(pool, move |conn| {
        let product_exists = products::table
            .find(submission.product_id)
            .select(products::id)
            .first::<Uuid>(conn)
            .optional()?
            .is_some();
        if !product_exists {
            return Err(QueryError::NotFound("product"));
        }

        let is_verified_purchase = match submission.order_id {
            Some(order_id) => {
                let status = orders::table
                    .filter(orders::id.eq(order_id))
                    .filter(orders::buyer_id.eq(submission.buyer_id))
                    .select(orders::status)
                    .first::<OrderStatus>(conn)
                    .optional()?;

                let contains_product = order_items::table
                    .filter(order_items::order_id.eq(order_id))
                    .filter(order_items::product_id.eq(submission.product_id))
                    .count()
                    .get_result::<i64>(conn)? > 0;

                matches!(status, Some(s) if s != OrderStatus::Cancelled) && contains_product
            },
            None => false
        };

        diesel::insert_into(reviews::table)
            .values(&NewReview{
                id: Uuid::new_v4(),
                product_id: submission.product_id,
                buyer_id: submission.buyer_id,
                order_id: submission.order_id.filter(|_| is_verified_purchase),
                rating: submission.rating.get(),
                title: submission.title,
                comment: submission.comment,
                is_verified_purchase,
                is_approved: false
            })
            .returning(Review::as_returning())
            .get_result(conn)
            .map_err(|e| match QueryError::from(e) {
                QueryError::Conflict(_) => QueryError::Conflict("You have already reviewed this product".into()),
                other => other
            })
    })
    .await
}

#[tracing::instrument("Marking review helpful", skip(pool))]
pub async fn mark_helpful(pool: &DbPool, review_id: Uuid) -> Result<Review, QueryError>{
    run_query(pool, move |conn| {
        diesel::update(reviews::table.find(review_id))
            .set(reviews::helpful_count.eq(reviews::helpful_count + 1))
            .returning(Review::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("review"))
    })
    .await
}

/// Stores the vendor's reply on a review of one of its products
#[tracing::instrument("Responding to review", skip(pool, response))]
pub async fn respond_to_review(pool: &DbPool, vendor_id: Uuid, review_id: Uuid, response: String) -> Result<Review, QueryError>{
    run_query(pool, move |conn| {
        let owner: Option<Uuid> = reviews::table
            .inner_join(products::table)
            .filter(reviews::id.eq(review_id))
            .select(products::vendor_id)
            .first(conn)
            .optional()?;
        if owner != Some(vendor_id) {
            return Err(QueryError::NotFound("review"));
        }

        let now = Utc::now();
        Ok(diesel::update(reviews::table.find(review_id))
            .set((
                reviews::vendor_response.eq(response),
                reviews::vendor_responded_at.eq(now),
                reviews::updated_at.eq(now)
            ))
            .returning(Review::as_returning())
            .get_result(conn)?)
    })
    .await
}

fn filtered(filters: &ReviewFilters) -> reviews::BoxedQuery<'static, Pg>{
    let mut query = reviews::table.into_boxed();
    if let Some(product_id) = filters.product_id {
        query = query.filter(reviews::product_id.eq(product_id));
    }
    if let Some(approved) = filters.is_approved {
        query = query.filter(reviews::is_approved.eq(approved));
    }
    query
}

#[tracing::instrument("Listing reviews", skip(pool))]
pub async fn list_reviews(pool: &DbPool, filters: ReviewFilters, page: PageQuery) -> Result<(Vec<Review>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let reviews = filtered(&filters)
            .select(Review::as_select())
            .order(reviews::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((reviews, count))
    })
    .await
}

#[tracing::instrument("Approving review", skip(pool))]
pub async fn approve_review(pool: &DbPool, review_id: Uuid) -> Result<Review, QueryError>{
    run_query(pool, move |conn| {
        diesel::update(reviews::table.find(review_id))
            .set((reviews::is_approved.eq(true), reviews::updated_at.eq(Utc::now())))
            .returning(Review::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("review"))
    })
    .await
}

#[tracing::instrument("Deleting review", skip(pool))]
pub async fn delete_review(pool: &DbPool, review_id: Uuid) -> Result<(), QueryError>{
    run_query(pool, move |conn| {
        let deleted = diesel::delete(reviews::table.find(review_id)).execute(conn)?;
        if deleted == 0 {
            return Err(QueryError::NotFound("review"));
        }
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::ReviewStats;

    #[test]
    fn stats_of_no_reviews_are_zero(){
        let stats = ReviewStats::from_ratings(&[]);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.total_reviews, 0);
    }

    #[test]
    fn average_is_rounded_to_two_decimals(){
        let stats = ReviewStats::from_ratings(&[5, 4, 4]);
        assert_eq!(stats.average_rating, 4.33);
        assert_eq!(stats.distribution, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn out_of_range_ratings_are_ignored(){
        let stats = ReviewStats::from_ratings(&[0, 6, 3]);
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.average_rating, 3.0);
    }
}
