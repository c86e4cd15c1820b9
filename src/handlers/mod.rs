pub mod auth;
pub mod emotion;
pub mod reaction;

pub use auth::*;
