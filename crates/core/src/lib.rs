//! `finpuls-core` — shared foundation building blocks.
//!
//! This crate contains the error taxonomy, the entity metadata consumed by
//! the persistence facade, and small domain helpers. It has no
//! infrastructure concerns.

pub mod entity;
pub mod error;
pub mod update;

pub use entity::{FieldDescriptor, FieldKind, FieldValue, Main, Persistable, Tokens, UnitMarker};
pub use error::{AppError, AppResult};
pub use update::{set_if_not_blank, set_if_some};
