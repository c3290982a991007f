pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::AuthMiddleware;
pub use cors::create_cors;
pub use rate_limit::RateLimitMiddleware;
