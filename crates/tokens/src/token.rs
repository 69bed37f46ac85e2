//! Bank access token entity and expiry lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finpuls_core::{AppError, AppResult, FieldDescriptor, FieldKind, FieldValue, Persistable, Tokens};

use crate::gateway::IssuedCredential;

const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// An access token issued by a bank for one user.
///
/// Lives in the tokens unit. The absolute expiry is computed once when the
/// ttl is set (`expires_at = now + expires_in`) and only recomputed when
/// the ttl is reset, e.g. on refresh. A token without a ttl never expires.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct BankToken {
    pub id: Option<Uuid>,
    pub user_id: String,
    pub bank_code: String,
    pub client_id: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BankToken {
    /// Store a freshly issued credential for `user_id` at `bank_code`.
    pub fn issue(
        user_id: impl Into<String>,
        bank_code: impl Into<String>,
        client_id: impl Into<String>,
        credential: IssuedCredential,
    ) -> AppResult<Self> {
        let mut token = Self {
            user_id: user_id.into(),
            bank_code: bank_code.into(),
            client_id: client_id.into(),
            access_token: credential.access_token,
            token_type: credential
                .token_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            ..Default::default()
        };
        token.reset_ttl(credential.expires_in)?;
        Ok(token)
    }

    /// Example instance matching one user's token at one bank: only the
    /// two key fields are populated.
    pub fn example(user_id: &str, bank_code: &str) -> Self {
        Self { user_id: user_id.to_string(), bank_code: bank_code.to_string(), ..Default::default() }
    }

    /// Recompute the absolute expiry from the current time. `None` clears
    /// the expiry: the token is then treated as never-expiring.
    pub fn reset_ttl(&mut self, ttl_seconds: Option<i64>) -> AppResult<()> {
        if let Some(ttl) = ttl_seconds {
            if ttl < 0 {
                return Err(AppError::validation("expiresIn", "must not be negative"));
            }
        }
        self.expires_in = ttl_seconds;
        self.expires_at = ttl_seconds.map(|ttl| Utc::now() + Duration::seconds(ttl));
        Ok(())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl Persistable for BankToken {
    const TABLE: &'static str = "bank_tokens";
    type Unit = Tokens;

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn fields() -> &'static [FieldDescriptor<Self>] {
        const FIELDS: &[FieldDescriptor<BankToken>] = &[
            FieldDescriptor {
                name: "user_id",
                column: "user_id",
                kind: FieldKind::Text,
                get: |t| Some(FieldValue::Text(t.user_id.clone())),
            },
            FieldDescriptor {
                name: "bank_code",
                column: "bank_code",
                kind: FieldKind::Text,
                get: |t| Some(FieldValue::Text(t.bank_code.clone())),
            },
            FieldDescriptor {
                name: "client_id",
                column: "client_id",
                kind: FieldKind::Text,
                get: |t| Some(FieldValue::Text(t.client_id.clone())),
            },
            FieldDescriptor {
                name: "access_token",
                column: "access_token",
                kind: FieldKind::Text,
                get: |t| Some(FieldValue::Text(t.access_token.clone())),
            },
            FieldDescriptor {
                name: "token_type",
                column: "token_type",
                kind: FieldKind::Text,
                get: |t| Some(FieldValue::Text(t.token_type.clone())),
            },
            FieldDescriptor {
                name: "expires_in",
                column: "expires_in",
                kind: FieldKind::Int,
                get: |t| t.expires_in.map(FieldValue::Int),
            },
            FieldDescriptor {
                name: "expires_at",
                column: "expires_at",
                kind: FieldKind::Timestamp,
                get: |t| t.expires_at.map(FieldValue::Timestamp),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(ttl: Option<i64>) -> IssuedCredential {
        IssuedCredential {
            access_token: "tok-1".into(),
            token_type: None,
            expires_in: ttl,
        }
    }

    #[test]
    fn issue_computes_absolute_expiry_from_ttl() {
        let before = Utc::now();
        let token = BankToken::issue("u1", "sber", "c1", credential(Some(3600))).unwrap();
        let after = Utc::now();

        let expires_at = token.expires_at.unwrap();
        assert!(expires_at >= before + Duration::seconds(3600));
        assert!(expires_at <= after + Duration::seconds(3600));
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.token_type, "bearer");
    }

    #[test]
    fn fresh_token_is_not_expired_and_passes_its_expiry_later() {
        let token = BankToken::issue("u1", "sber", "c1", credential(Some(3600))).unwrap();
        assert!(!token.is_expired());

        let later = token.expires_at.unwrap() + Duration::seconds(1);
        assert!(token.is_expired_at(later));
    }

    #[test]
    fn absent_ttl_means_never_expiring() {
        let token = BankToken::issue("u1", "sber", "c1", credential(None)).unwrap();
        assert!(token.expires_at.is_none());
        assert!(!token.is_expired_at(Utc::now() + Duration::days(10_000)));
    }

    #[test]
    fn negative_ttl_is_a_validation_error() {
        let err = BankToken::issue("u1", "sber", "c1", credential(Some(-5))).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn reset_ttl_recomputes_from_current_time() {
        let mut token = BankToken::issue("u1", "sber", "c1", credential(Some(10))).unwrap();
        let first_expiry = token.expires_at.unwrap();

        token.reset_ttl(Some(7200)).unwrap();
        let second_expiry = token.expires_at.unwrap();
        assert!(second_expiry > first_expiry);
        assert_eq!(token.expires_in, Some(7200));

        token.reset_ttl(None).unwrap();
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn example_populates_only_the_key_fields() {
        let example = BankToken::example("u1", "sber");
        assert_eq!(example.user_id, "u1");
        assert_eq!(example.bank_code, "sber");
        assert!(example.access_token.is_empty());
        assert!(example.id.is_none());
    }
}
