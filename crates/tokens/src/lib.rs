//! `finpuls-tokens` — bank credential entity, lifecycle, and service.

pub mod gateway;
pub mod service;
pub mod token;

pub use gateway::{BankGateway, IssuedCredential};
pub use service::{ConnectBank, TokenService};
pub use token::BankToken;
