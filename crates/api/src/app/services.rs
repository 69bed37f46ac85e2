//! Service wiring over the storage router.

use std::sync::Arc;

use async_trait::async_trait;

use finpuls_core::{AppError, AppResult};
use finpuls_infra::{SqlRepository, StorageRouter};
use finpuls_subscriptions::{PlanService, SubscriptionPlan};
use finpuls_tokens::{BankGateway, BankToken, IssuedCredential, TokenService};
use finpuls_users::{User, UserService};

pub type Plans = PlanService<SqlRepository<SubscriptionPlan>>;
pub type Users = UserService<SqlRepository<User>, SqlRepository<SubscriptionPlan>>;
pub type Tokens = TokenService<SqlRepository<BankToken>, Arc<dyn BankGateway>>;

/// The gateway's services, each backed by the storage unit that owns its
/// entity family (plans and users by the main unit, bank tokens by the
/// tokens unit).
pub struct AppServices {
    pub plans: Plans,
    pub users: Users,
    pub tokens: Tokens,
}

pub fn build_services(storage: &StorageRouter, gateway: Arc<dyn BankGateway>) -> AppServices {
    AppServices {
        plans: PlanService::new(storage.repository::<SubscriptionPlan>()),
        users: UserService::new(
            storage.repository::<User>(),
            storage.repository::<SubscriptionPlan>(),
        ),
        tokens: TokenService::new(storage.repository::<BankToken>(), gateway),
    }
}

/// Placeholder gateway for deployments without a bank integration: every
/// upstream call is refused as an upstream error naming the bank.
pub struct UnconfiguredBankGateway;

#[async_trait]
impl BankGateway for UnconfiguredBankGateway {
    async fn exchange_code(
        &self,
        bank_code: &str,
        _client_id: &str,
        _authorization_code: &str,
    ) -> AppResult<IssuedCredential> {
        Err(unconfigured(bank_code))
    }

    async fn refresh(&self, bank_code: &str, _access_token: &str) -> AppResult<IssuedCredential> {
        Err(unconfigured(bank_code))
    }
}

fn unconfigured(bank_code: &str) -> AppError {
    AppError::UpstreamApi {
        system: bank_code.to_string(),
        message: "no bank gateway is configured".to_string(),
    }
}
