pub mod jwt;
pub mod extractors;

pub use extractors::{IsAdmin, IsSuperAdmin, IsUser, IsVendor};
pub use jwt::{Claims, Tokenizer, UserRole};
