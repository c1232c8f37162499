pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::{QuizLinkClaims, StudentClaims};
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedStudent};
