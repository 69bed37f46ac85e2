//! User entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finpuls_core::{FieldDescriptor, FieldKind, FieldValue, Main, Persistable};

/// User lifecycle status, stored as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Blocked => "BLOCKED",
        }
    }
}

/// Raised when a persisted status value is not part of the enum.
#[derive(Debug, thiserror::Error)]
#[error("unknown user status '{0}'")]
pub struct UnknownStatus(String);

impl TryFrom<String> for UserStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "ACTIVE" => Ok(Self::Active),
            "BLOCKED" => Ok(Self::Blocked),
            _ => Err(UnknownStatus(value)),
        }
    }
}

/// A gateway user. `client_id` is the external identity the caller
/// authenticates with and is unique within the main unit.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Option<Uuid>,
    pub client_id: String,
    pub subscription_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(client_id: impl Into<String>, subscription_id: Uuid, status: UserStatus) -> Self {
        Self {
            id: None,
            client_id: client_id.into(),
            subscription_id,
            status,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Persistable for User {
    const TABLE: &'static str = "users";
    type Unit = Main;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        const FIELDS: &[FieldDescriptor<User>] = &[
            FieldDescriptor {
                name: "client_id",
                column: "client_id",
                kind: FieldKind::Text,
                get: |u| Some(FieldValue::Text(u.client_id.clone())),
            },
            FieldDescriptor {
                name: "subscription_id",
                column: "subscription_id",
                kind: FieldKind::Uuid,
                get: |u| Some(FieldValue::Uuid(u.subscription_id)),
            },
            FieldDescriptor {
                name: "status",
                column: "status",
                kind: FieldKind::Text,
                get: |u| Some(FieldValue::Text(u.status.as_str().to_string())),
            },
        ];
        FIELDS
    }

    fn stamp(&mut self, id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }
}
