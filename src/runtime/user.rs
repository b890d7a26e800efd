use std::collections::HashMap;

use crate::runtime::error::ServiceError;

pub const CLAIM_USER_ID: &str = "sub";
pub const CLAIM_EMAIL: &str = "email";
pub const CLAIM_NAME: &str = "name";

/// Identity of the caller, passed explicitly into every service call that
/// needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUserContext {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
}

impl CurrentUserContext {
    pub fn new(user_id: &str, email: &str, full_name: &str) -> Self {
        CurrentUserContext {
            user_id: user_id.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
        }
    }

    /// Builds the context from token claims. Every claim must be present
    /// and non-empty.
    pub fn from_claims(claims: &HashMap<String, String>) -> Result<Self, ServiceError> {
        let claim = |key: &str| {
            claims
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| ServiceError::security(format!("missing claim {}", key)))
        };
        Ok(CurrentUserContext {
            user_id: claim(CLAIM_USER_ID)?,
            email: claim(CLAIM_EMAIL)?,
            full_name: claim(CLAIM_NAME)?,
        })
    }

    /// Name written into audit columns.
    pub fn audit_name(&self) -> &str {
        &self.full_name
    }
}
