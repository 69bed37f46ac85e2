//! Subscription plan entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finpuls_core::{FieldDescriptor, FieldKind, FieldValue, Main, Persistable};

/// A subscription plan. `name` is unique within the main unit
/// (case-insensitive at the service level, enforced by
/// `uk_subscription_plans_name` in the database).
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionPlan {
    pub id: Option<Uuid>,
    pub name: String,
    pub price: f64,
    #[sqlx(rename = "is_active")]
    pub active: bool,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubscriptionPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), active: true, ..Default::default() }
    }
}

impl Persistable for SubscriptionPlan {
    const TABLE: &'static str = "subscription_plans";
    type Unit = Main;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        const FIELDS: &[FieldDescriptor<SubscriptionPlan>] = &[
            FieldDescriptor {
                name: "name",
                column: "name",
                kind: FieldKind::Text,
                get: |p| Some(FieldValue::Text(p.name.clone())),
            },
            FieldDescriptor {
                name: "price",
                column: "price",
                kind: FieldKind::Float,
                get: |p| Some(FieldValue::Float(p.price)),
            },
            FieldDescriptor {
                name: "active",
                column: "is_active",
                kind: FieldKind::Bool,
                get: |p| Some(FieldValue::Bool(p.active)),
            },
            FieldDescriptor {
                name: "description",
                column: "description",
                kind: FieldKind::Text,
                get: |p| Some(FieldValue::Text(p.description.clone())),
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
