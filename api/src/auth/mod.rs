//! Authentication
//!
//! Every route except `/health` and `/bootstrap` goes through
//! [`auth_middleware`], which resolves the bearer API key to a [`User`].
//!
//! [`User`]: crate::domain::entities::User

pub mod api_key;

pub use api_key::auth_middleware;
