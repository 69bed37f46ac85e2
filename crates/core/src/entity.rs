//! Entity metadata used by the generic persistence facade.
//!
//! Each persistent entity family declares, once, the table it lives in, the
//! storage unit that owns it, and a typed descriptor per data column. The
//! descriptors replace any runtime name-based field lookup: probes and SQL
//! are built from this table, and an unknown field name is rejected before
//! a query is ever issued.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Marker trait for storage unit assignment. Implemented by unit marker
/// types only; an entity family names its unit through `Persistable::Unit`.
pub trait UnitMarker: Send + Sync + 'static {
    /// Unit name used in configuration and logs.
    const NAME: &'static str;
}

/// The primary durable store.
#[derive(Debug, Clone, Copy)]
pub struct Main;

/// The secondary store holding short-lived bank credentials.
#[derive(Debug, Clone, Copy)]
pub struct Tokens;

impl UnitMarker for Main {
    const NAME: &'static str = "main";
}

impl UnitMarker for Tokens {
    const NAME: &'static str = "tokens";
}

/// SQL type of a described column. Drives parameter binding and decides
/// whether equality predicates compare case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Uuid,
    Bool,
    Int,
    Float,
    Timestamp,
}

/// A concrete value for a described column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Uuid(Uuid),
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Uuid(_) => FieldKind::Uuid,
            Self::Bool(_) => FieldKind::Bool,
            Self::Int(_) => FieldKind::Int,
            Self::Float(_) => FieldKind::Float,
            Self::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    /// True for text values that are empty or whitespace-only. A probe
    /// treats such values as "field not populated".
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// One data column of an entity family: logical field name, SQL column,
/// column type, and an accessor reading the current value from an instance.
/// The accessor returns `None` when the column is NULL for that instance.
pub struct FieldDescriptor<E> {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub get: fn(&E) -> Option<FieldValue>,
}

/// A domain record owned by the generic persistence facade.
///
/// Identifiers and the two audit timestamps are populated by the owning
/// storage unit, never by application code; `stamp` is how a storage
/// implementation writes them back onto an instance.
pub trait Persistable: Send + Sync + Sized {
    /// Table this family is persisted in.
    const TABLE: &'static str;

    /// Storage unit that owns this family for its entire lifetime.
    type Unit: UnitMarker;

    /// Identifier, if the instance has been persisted (or carries an
    /// explicit id for an update).
    fn id(&self) -> Option<Uuid>;

    /// Creation timestamp, if the instance has been persisted.
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Descriptor table for the family's data columns (id and audit
    /// timestamps excluded).
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Apply the server-populated columns a storage unit fills in on write.
    fn stamp(&mut self, id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    /// Look up a descriptor by logical field name.
    fn descriptor(name: &str) -> Option<&'static FieldDescriptor<Self>> {
        Self::fields().iter().find(|d| d.name == name)
    }
}
