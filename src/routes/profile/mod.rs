pub mod get;
pub mod update;
pub mod addresses;

pub use get::get_profile;
pub use update::update_profile_info;
pub use addresses::{get_addresses, make_default_address, post_address, remove_address};
