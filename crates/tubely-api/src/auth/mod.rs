pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{issue_access_token, validate_access_token, JwtService};
pub use middleware::{auth_middleware, AuthState};
pub use models::AuthUser;
