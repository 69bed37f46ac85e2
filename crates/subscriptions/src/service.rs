//! Subscription plan management.

use std::collections::BTreeMap;

use serde::Deserialize;
use uuid::Uuid;

use finpuls_core::{AppError, AppResult, set_if_not_blank, set_if_some};
use finpuls_infra::EntityStore;

use crate::plan::SubscriptionPlan;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlan {
    pub name: String,
    pub price: Option<f64>,
    pub active: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub active: Option<bool>,
    pub description: Option<String>,
}

/// Plan operations over the generic persistence facade.
#[derive(Debug, Clone)]
pub struct PlanService<S> {
    store: S,
}

impl<S: EntityStore<SubscriptionPlan>> PlanService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a plan. All validation problems are reported in one map.
    pub async fn create(&self, req: CreatePlan) -> AppResult<SubscriptionPlan> {
        let mut errors = BTreeMap::new();

        let name = req.name.trim();
        if name.is_empty() {
            errors.insert("name".to_string(), "must not be blank".to_string());
        }
        if let Some(price) = req.price {
            if price < 0.0 {
                errors.insert("price".to_string(), "must not be negative".to_string());
            }
        }
        if !errors.is_empty() {
            return Err(AppError::validation_map(errors));
        }

        if self.store.exists_by_field("name", name.into()).await? {
            return Err(AppError::validation(
                "name",
                format!("a plan named '{name}' already exists"),
            ));
        }

        let mut plan = SubscriptionPlan::new(name);
        set_if_some(req.price, &mut plan.price);
        set_if_some(req.active, &mut plan.active);
        set_if_some(req.description, &mut plan.description);

        let saved = self.store.save(plan).await?;
        tracing::info!(plan = %saved.name, "subscription plan created");
        Ok(saved)
    }

    /// Partially update a plan: omitted fields keep their persisted value.
    pub async fn update(&self, id: Uuid, req: UpdatePlan) -> AppResult<SubscriptionPlan> {
        let mut plan = self.get(id).await?;

        if let Some(name) = req.name.as_deref() {
            let name = name.trim();
            if !name.is_empty() && !name.eq_ignore_ascii_case(&plan.name) {
                if self.store.exists_by_field("name", name.into()).await? {
                    return Err(AppError::validation(
                        "name",
                        format!("a plan named '{name}' already exists"),
                    ));
                }
            }
        }

        set_if_not_blank(req.name, &mut plan.name);
        set_if_some(req.price, &mut plan.price);
        set_if_some(req.active, &mut plan.active);
        set_if_some(req.description, &mut plan.description);

        Ok(self.store.save(plan).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SubscriptionPlan> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("subscription plan not found: {id}")))
    }

    pub async fn list(&self) -> AppResult<Vec<SubscriptionPlan>> {
        Ok(self.store.find_all().await?)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        Ok(self.store.delete_by_id(id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<SubscriptionPlan>> {
        Ok(self.store.find_by_field("name", name.into()).await?)
    }

    pub async fn find_all_active(&self) -> AppResult<Vec<SubscriptionPlan>> {
        Ok(self.store.find_all_by_field("active", true.into()).await?)
    }

    pub async fn activate(&self, id: Uuid) -> AppResult<SubscriptionPlan> {
        self.set_active(id, true).await
    }

    pub async fn deactivate(&self, id: Uuid) -> AppResult<SubscriptionPlan> {
        self.set_active(id, false).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<SubscriptionPlan> {
        let mut plan = self.get(id).await?;
        plan.active = active;
        Ok(self.store.save(plan).await?)
    }
}
