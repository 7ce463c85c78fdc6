pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtService, JwtServiceImpl};
pub use middleware::{OptionalUser, UserExtractor, optional_auth_middleware, require_auth_middleware};
