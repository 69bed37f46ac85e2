//! `finpuls-subscriptions` — subscription plan entity and service.

pub mod plan;
pub mod service;

pub use plan::SubscriptionPlan;
pub use service::{CreatePlan, PlanService, UpdatePlan};
