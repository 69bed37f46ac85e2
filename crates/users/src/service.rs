//! User management and entitlement checks.

use std::collections::BTreeMap;

use serde::Deserialize;
use uuid::Uuid;

use finpuls_core::{AppError, AppResult};
use finpuls_infra::EntityStore;
use finpuls_subscriptions::SubscriptionPlan;

use crate::user::{User, UserStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub client_id: String,
    pub subscription_id: Uuid,
    pub status: Option<UserStatus>,
}

/// User operations. Users live in the main unit, alongside plans; the two
/// lookups in `require_feature` are plain reads, no shared transaction is
/// needed.
#[derive(Debug, Clone)]
pub struct UserService<S, P> {
    users: S,
    plans: P,
}

impl<S, P> UserService<S, P>
where
    S: EntityStore<User>,
    P: EntityStore<SubscriptionPlan>,
{
    pub fn new(users: S, plans: P) -> Self {
        Self { users, plans }
    }

    pub async fn create(&self, req: CreateUser) -> AppResult<User> {
        let mut errors = BTreeMap::new();

        let client_id = req.client_id.trim();
        if client_id.is_empty() {
            errors.insert("clientId".to_string(), "must not be blank".to_string());
        }
        if req.subscription_id.is_nil() {
            errors.insert("subscriptionId".to_string(), "must not be nil".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::validation_map(errors));
        }

        if self.users.exists_by_field("client_id", client_id.into()).await? {
            return Err(AppError::validation(
                "clientId",
                format!("a user with client id '{client_id}' already exists"),
            ));
        }
        if !self.plans.exists_by_id(req.subscription_id).await? {
            return Err(AppError::validation(
                "subscriptionId",
                format!("unknown subscription plan: {}", req.subscription_id),
            ));
        }

        let user = User::new(client_id, req.subscription_id, req.status.unwrap_or_default());
        let saved = self.users.save(user).await?;
        tracing::info!(client_id = %saved.client_id, "user created");
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user not found: {id}")))
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.users.find_all().await?)
    }

    pub async fn find_by_client_id(&self, client_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.find_by_field("client_id", client_id.into()).await?)
    }

    pub async fn exists_by_client_id(&self, client_id: &str) -> AppResult<bool> {
        Ok(self.users.exists_by_field("client_id", client_id.into()).await?)
    }

    pub async fn find_all_by_status(&self, status: UserStatus) -> AppResult<Vec<User>> {
        Ok(self.users.find_all_by_field("status", status.as_str().into()).await?)
    }

    pub async fn change_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        let mut user = self.get(id).await?;
        user.status = status;
        Ok(self.users.save(user).await?)
    }

    /// Entitlement gate: the user must exist and be on an active plan,
    /// otherwise the operation named by `feature` is refused.
    pub async fn require_feature(&self, client_id: &str, feature: &str) -> AppResult<User> {
        let user = self
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user not found: {client_id}")))?;

        let plan = self.plans.find_by_id(user.subscription_id).await?;
        let entitled = plan.map(|p| p.active).unwrap_or(false);
        if !entitled || user.status != UserStatus::Active {
            return Err(AppError::SubscriptionRequired { feature: feature.to_string() });
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use finpuls_infra::InMemoryStore;
    use finpuls_subscriptions::{CreatePlan, PlanService};
    use std::sync::Arc;

    use super::*;

    struct Fixture {
        users: UserService<InMemoryStore<User>, SharedPlans>,
        plans: PlanService<SharedPlans>,
    }

    type SharedPlans = Arc<InMemoryStore<SubscriptionPlan>>;

    // Arc store shared between the plan service and the user service, the
    // way both run against the same main unit in production.
    fn fixture() -> Fixture {
        let plan_store: SharedPlans = Arc::new(InMemoryStore::new());
        Fixture {
            users: UserService::new(InMemoryStore::new(), plan_store.clone()),
            plans: PlanService::new(plan_store),
        }
    }

    async fn plan(fx: &Fixture, name: &str) -> SubscriptionPlan {
        fx.plans
            .create(CreatePlan { name: name.into(), price: Some(5.0), active: None, description: None })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_defaults_status_to_active() {
        let fx = fixture();
        let plan = plan(&fx, "Pro").await;

        let user = fx
            .users
            .create(CreateUser {
                client_id: "client-1".into(),
                subscription_id: plan.id.unwrap(),
                status: None,
            })
            .await
            .unwrap();

        assert_eq!(user.status, UserStatus::Active);
        assert!(user.id.is_some());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_client_id() {
        let fx = fixture();
        let plan = plan(&fx, "Pro").await;
        let req = CreateUser {
            client_id: "client-1".into(),
            subscription_id: plan.id.unwrap(),
            status: None,
        };

        fx.users.create(req.clone()).await.unwrap();
        let err = fx.users.create(req).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_rejects_unknown_plan() {
        let fx = fixture();
        let err = fx
            .users
            .create(CreateUser {
                client_id: "client-1".into(),
                subscription_id: Uuid::new_v4(),
                status: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn require_feature_passes_for_active_plan() {
        let fx = fixture();
        let plan = plan(&fx, "Pro").await;
        fx.users
            .create(CreateUser {
                client_id: "client-1".into(),
                subscription_id: plan.id.unwrap(),
                status: None,
            })
            .await
            .unwrap();

        let user = fx.users.require_feature("client-1", "reports").await.unwrap();
        assert_eq!(user.client_id, "client-1");
    }

    #[tokio::test]
    async fn require_feature_refuses_inactive_plan_and_names_the_feature() {
        let fx = fixture();
        let plan = plan(&fx, "Pro").await;
        fx.users
            .create(CreateUser {
                client_id: "client-1".into(),
                subscription_id: plan.id.unwrap(),
                status: None,
            })
            .await
            .unwrap();
        fx.plans.deactivate(plan.id.unwrap()).await.unwrap();

        let err = fx.users.require_feature("client-1", "reports").await.unwrap_err();
        assert_eq!(err.code(), "SUBSCRIPTION_REQUIRED");
        assert_eq!(err.status(), 403);
        assert_eq!(err.context().unwrap()["feature"], "reports");
    }

    #[tokio::test]
    async fn require_feature_refuses_blocked_user() {
        let fx = fixture();
        let plan = plan(&fx, "Pro").await;
        let user = fx
            .users
            .create(CreateUser {
                client_id: "client-1".into(),
                subscription_id: plan.id.unwrap(),
                status: None,
            })
            .await
            .unwrap();
        fx.users.change_status(user.id.unwrap(), UserStatus::Blocked).await.unwrap();

        let err = fx.users.require_feature("client-1", "reports").await.unwrap_err();
        assert_eq!(err.code(), "SUBSCRIPTION_REQUIRED");
    }

    #[tokio::test]
    async fn find_all_by_status_filters() {
        let fx = fixture();
        let plan = plan(&fx, "Pro").await;
        for i in 0..3 {
            fx.users
                .create(CreateUser {
                    client_id: format!("client-{i}"),
                    subscription_id: plan.id.unwrap(),
                    status: None,
                })
                .await
                .unwrap();
        }
        let blocked_user = fx.users.find_by_client_id("client-0").await.unwrap().unwrap();
        fx.users.change_status(blocked_user.id.unwrap(), UserStatus::Blocked).await.unwrap();

        assert_eq!(fx.users.find_all_by_status(UserStatus::Active).await.unwrap().len(), 2);
        assert_eq!(fx.users.find_all_by_status(UserStatus::Blocked).await.unwrap().len(), 1);
    }
}
