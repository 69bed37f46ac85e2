//! Response DTOs and mapping from domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finpuls_subscriptions::SubscriptionPlan;
use finpuls_tokens::BankToken;
use finpuls_users::{User, UserStatus};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub id: Option<Uuid>,
    pub name: String,
    pub price: f64,
    pub active: bool,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionPlan> for PlanDto {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            price: plan.price,
            active: plan.active,
            description: plan.description,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Option<Uuid>,
    pub client_id: String,
    pub subscription_id: Uuid,
    pub status: UserStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            client_id: user.client_id,
            subscription_id: user.subscription_id,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTokenDto {
    pub bank_code: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<BankToken> for BankTokenDto {
    fn from(token: BankToken) -> Self {
        Self {
            bank_code: token.bank_code,
            access_token: token.access_token,
            token_type: token.token_type,
            expires_at: token.expires_at,
        }
    }
}

/// Status change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status: UserStatus,
}
