//! Bank token lifecycle service.
//!
//! Every gateway call completes before the corresponding storage write
//! starts, so no transaction or pooled connection is ever held across an
//! upstream await.

use std::collections::BTreeMap;

use serde::Deserialize;

use finpuls_core::{AppError, AppResult};
use finpuls_infra::EntityStore;

use crate::gateway::BankGateway;
use crate::token::BankToken;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectBank {
    pub client_id: String,
    pub authorization_code: String,
}

#[derive(Debug, Clone)]
pub struct TokenService<S, G> {
    store: S,
    gateway: G,
}

impl<S, G> TokenService<S, G>
where
    S: EntityStore<BankToken>,
    G: BankGateway,
{
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Connect `user_id` to a bank: exchange the authorization code
    /// upstream, then store the issued credential. Reconnecting an
    /// already connected bank replaces the stored credential.
    pub async fn connect(
        &self,
        user_id: &str,
        bank_code: &str,
        req: ConnectBank,
    ) -> AppResult<BankToken> {
        let mut errors = BTreeMap::new();
        if req.client_id.trim().is_empty() {
            errors.insert("clientId".to_string(), "must not be blank".to_string());
        }
        if req.authorization_code.trim().is_empty() {
            errors.insert("authorizationCode".to_string(), "must not be blank".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::validation_map(errors));
        }

        let credential = self
            .gateway
            .exchange_code(bank_code, &req.client_id, &req.authorization_code)
            .await?;

        let saved = match self.store.find_by_example(&BankToken::example(user_id, bank_code)).await? {
            Some(mut existing) => {
                existing.client_id = req.client_id;
                existing.access_token = credential.access_token;
                if let Some(token_type) = credential.token_type.filter(|t| !t.trim().is_empty()) {
                    existing.token_type = token_type;
                }
                existing.reset_ttl(credential.expires_in)?;
                self.store.save(existing).await?
            }
            None => {
                let token = BankToken::issue(user_id, bank_code, req.client_id, credential)?;
                self.store.save(token).await?
            }
        };
        tracing::info!(bank = bank_code, "bank connected");
        Ok(saved)
    }

    /// The stored credential for `user_id` at `bank_code`, refusing
    /// missing connections and expired tokens.
    pub async fn access_token(&self, user_id: &str, bank_code: &str) -> AppResult<BankToken> {
        let token = self.required(user_id, bank_code).await?;
        if token.is_expired() {
            return Err(AppError::TokenExpired {
                bank: bank_code.to_string(),
                user_id: user_id.to_string(),
            });
        }
        Ok(token)
    }

    /// Obtain a fresh credential from the bank and reset the stored ttl.
    /// The expiry is recomputed from now, not from the original issuance.
    pub async fn refresh(&self, user_id: &str, bank_code: &str) -> AppResult<BankToken> {
        let mut token = self.required(user_id, bank_code).await?;

        // Upstream first; the storage write only starts once the bank has
        // answered.
        let credential = self.gateway.refresh(bank_code, &token.access_token).await?;

        token.access_token = credential.access_token;
        if let Some(token_type) = credential.token_type.filter(|t| !t.trim().is_empty()) {
            token.token_type = token_type;
        }
        token.reset_ttl(credential.expires_in)?;
        Ok(self.store.save(token).await?)
    }

    /// Drop the stored credential.
    pub async fn disconnect(&self, user_id: &str, bank_code: &str) -> AppResult<()> {
        let token = self.required(user_id, bank_code).await?;
        let id = token.id.ok_or_else(|| AppError::internal("persisted token without id"))?;
        self.store.delete_by_id(id).await?;
        tracing::info!(bank = bank_code, "bank disconnected");
        Ok(())
    }

    async fn required(&self, user_id: &str, bank_code: &str) -> AppResult<BankToken> {
        self.store
            .find_by_example(&BankToken::example(user_id, bank_code))
            .await?
            .ok_or_else(|| AppError::BankNotConnected {
                bank: bank_code.to_string(),
                user_id: user_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use finpuls_infra::InMemoryStore;

    use crate::gateway::IssuedCredential;

    use super::*;

    /// Scripted gateway: hands out numbered tokens, or fails.
    struct ScriptedGateway {
        ttl: Option<i64>,
        fail: bool,
        calls: Mutex<u32>,
    }

    impl ScriptedGateway {
        fn ok(ttl: Option<i64>) -> Self {
            Self { ttl, fail: false, calls: Mutex::new(0) }
        }

        fn failing() -> Self {
            Self { ttl: None, fail: true, calls: Mutex::new(0) }
        }

        fn next(&self, bank_code: &str) -> AppResult<IssuedCredential> {
            if self.fail {
                return Err(AppError::UpstreamApi {
                    system: bank_code.to_string(),
                    message: "upstream unavailable".to_string(),
                });
            }
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(IssuedCredential {
                access_token: format!("token-{}", *calls),
                token_type: None,
                expires_in: self.ttl,
            })
        }
    }

    #[async_trait]
    impl BankGateway for ScriptedGateway {
        async fn exchange_code(
            &self,
            bank_code: &str,
            _client_id: &str,
            _authorization_code: &str,
        ) -> AppResult<IssuedCredential> {
            self.next(bank_code)
        }

        async fn refresh(&self, bank_code: &str, _access_token: &str) -> AppResult<IssuedCredential> {
            self.next(bank_code)
        }
    }

    fn service(gateway: ScriptedGateway) -> TokenService<InMemoryStore<BankToken>, ScriptedGateway> {
        TokenService::new(InMemoryStore::new(), gateway)
    }

    fn connect_req() -> ConnectBank {
        ConnectBank { client_id: "c1".into(), authorization_code: "code".into() }
    }

    #[tokio::test]
    async fn connect_stores_the_issued_credential() {
        let svc = service(ScriptedGateway::ok(Some(3600)));
        let token = svc.connect("u1", "sber", connect_req()).await.unwrap();

        assert_eq!(token.access_token, "token-1");
        assert!(token.id.is_some());
        assert!(token.expires_at.is_some());
    }

    #[tokio::test]
    async fn connect_validates_blank_inputs_in_one_map() {
        let svc = service(ScriptedGateway::ok(None));
        let err = svc
            .connect("u1", "sber", ConnectBank { client_id: " ".into(), authorization_code: "".into() })
            .await
            .unwrap_err();

        let AppError::Validation { errors } = err else { panic!("expected validation") };
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn reconnect_replaces_the_stored_credential() {
        let svc = service(ScriptedGateway::ok(Some(3600)));
        let first = svc.connect("u1", "sber", connect_req()).await.unwrap();
        let second = svc.connect("u1", "sber", connect_req()).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.access_token, "token-2");

        let all = svc.store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_upstream_error_and_stores_nothing() {
        let svc = service(ScriptedGateway::failing());
        let err = svc.connect("u1", "sber", connect_req()).await.unwrap_err();

        assert_eq!(err.code(), "BANK_API_ERROR");
        assert_eq!(err.status(), 502);
        assert!(svc.store.is_empty());
    }

    #[tokio::test]
    async fn access_token_of_unconnected_bank_is_refused() {
        let svc = service(ScriptedGateway::ok(None));
        let err = svc.access_token("u1", "sber").await.unwrap_err();

        assert_eq!(err.code(), "BANK_NOT_CONNECTED");
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn expired_token_is_refused_with_its_own_kind() {
        let svc = service(ScriptedGateway::ok(Some(0)));
        svc.connect("u1", "sber", connect_req()).await.unwrap();

        let err = svc.access_token("u1", "sber").await.unwrap_err();
        assert_eq!(err.code(), "TOKEN_EXPIRED");
        assert_eq!(err.status(), 401);
        assert_eq!(err.context().unwrap()["bank"], "sber");
    }

    #[tokio::test]
    async fn refresh_recomputes_expiry_from_now() {
        let svc = service(ScriptedGateway::ok(Some(3600)));
        let first = svc.connect("u1", "sber", connect_req()).await.unwrap();

        let refreshed = svc.refresh("u1", "sber").await.unwrap();
        assert_eq!(refreshed.access_token, "token-2");
        assert!(refreshed.expires_at.unwrap() >= first.expires_at.unwrap());
        assert!(refreshed.expires_at.unwrap() <= Utc::now() + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn disconnect_removes_the_token() {
        let svc = service(ScriptedGateway::ok(None));
        svc.connect("u1", "sber", connect_req()).await.unwrap();

        svc.disconnect("u1", "sber").await.unwrap();
        let err = svc.access_token("u1", "sber").await.unwrap_err();
        assert_eq!(err.code(), "BANK_NOT_CONNECTED");
    }
}
