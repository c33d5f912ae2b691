pub mod get;
pub mod post;

pub use get::{get_order_by_id, get_orders};
pub use post::post_order;
