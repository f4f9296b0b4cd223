pub mod auth;

pub use auth::Principal;
