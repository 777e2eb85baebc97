pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{AdminUser, AuthMiddleware, AuthUser};
pub use cors::create_cors;
pub use rate_limit::RateLimitMiddleware;
