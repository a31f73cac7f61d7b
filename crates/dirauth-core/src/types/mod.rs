//! Core types for dirauth

mod credentials;
mod user;

pub use credentials::*;
pub use user::*;
