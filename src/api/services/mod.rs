pub mod catalog;
pub mod error_code;
pub mod health;
pub mod helpers;
pub mod recipes;
pub mod redirect;
pub mod routes;
pub mod types;
pub mod users;

pub use error_code::ErrorCode;
pub use health::{HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use routes::api_routes;
