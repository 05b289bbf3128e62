pub mod auth;

pub use auth::{AuthUser, CurrentUser, MaybeUser, TokenAuth};
