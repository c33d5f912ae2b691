pub mod categories;
pub mod products;
pub mod reviews;

pub use categories::get_categories;
pub use products::{get_product, get_products};
pub use reviews::{get_review_stats, get_reviews, post_helpful, post_review};
