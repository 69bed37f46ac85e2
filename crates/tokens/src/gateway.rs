//! Narrow seam to the upstream bank APIs.
//!
//! The gateway is the only place that talks to a bank. Its calls must
//! complete (or fail) outside any storage transaction, and retry policy —
//! if any — lives behind the implementation, not here.

use std::sync::Arc;

use async_trait::async_trait;

use finpuls_core::AppResult;

/// A credential granted by a bank.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Declared time-to-live in seconds. Absent means the credential does
    /// not expire.
    pub expires_in: Option<i64>,
}

/// Upstream bank operations needed by the token lifecycle.
///
/// Implementations report bank failures as
/// [`AppError::UpstreamApi`](finpuls_core::AppError::UpstreamApi) carrying
/// the bank's name.
#[async_trait]
pub trait BankGateway: Send + Sync {
    /// Exchange an authorization code for an access credential.
    async fn exchange_code(
        &self,
        bank_code: &str,
        client_id: &str,
        authorization_code: &str,
    ) -> AppResult<IssuedCredential>;

    /// Obtain a fresh credential for an already connected user.
    async fn refresh(&self, bank_code: &str, access_token: &str) -> AppResult<IssuedCredential>;
}

#[async_trait]
impl<T: BankGateway + ?Sized> BankGateway for Arc<T> {
    async fn exchange_code(
        &self,
        bank_code: &str,
        client_id: &str,
        authorization_code: &str,
    ) -> AppResult<IssuedCredential> {
        (**self).exchange_code(bank_code, client_id, authorization_code).await
    }

    async fn refresh(&self, bank_code: &str, access_token: &str) -> AppResult<IssuedCredential> {
        (**self).refresh(bank_code, access_token).await
    }
}
