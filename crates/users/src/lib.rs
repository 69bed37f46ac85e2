//! `finpuls-users` — user entity, service, and entitlement checks.

pub mod service;
pub mod user;

pub use service::{CreateUser, UserService};
pub use user::{User, UserStatus};
