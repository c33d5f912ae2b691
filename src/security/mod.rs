//! Admin portal protection: the network access policy, its middleware and the
//! login rate limiter.

pub mod access;
pub mod admin_guard;
pub mod rate_limit;

pub use access::{is_suspicious_user_agent, request_client_ip, request_host, AccessDenial, AccessPolicy};
pub use admin_guard::AdminGuardFactory;
pub use rate_limit::{Clock, ManualClock, RateLimitDecision, RateLimiter, SystemClock};
