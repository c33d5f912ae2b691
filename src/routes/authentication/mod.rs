pub mod register;
pub mod login;
pub mod admin_login;
pub mod logout;

pub use register::register;
pub use login::login;
pub use admin_login::admin_login;
pub use logout::logout;
