// Customer identity resolution
//
// A lookup may carry a customer id, an email, a phone, or any mix of them.
// A customer id is an exclusive match. Otherwise every usable contact field
// is matched, so an event that recorded only one of them still belongs to
// the customer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

/// Anything that is not a digit; stripped from phone numbers before matching
static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D+").expect("invalid non-digit pattern"));

/// Raw identity fields supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub customer_id: Option<Uuid>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// The match strategy chosen for a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMatch {
    CustomerId(Uuid),
    /// At least one field is present. An event matches on either.
    Contact {
        /// Trimmed and lowercased; compared exactly
        email: Option<String>,
        /// Digits only; compared as a substring of the stored digits
        phone: Option<String>,
    },
}

impl IdentityMatch {
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Contact { email, .. } => email.as_deref(),
            Self::CustomerId(_) => None,
        }
    }
}

impl CustomerIdentity {
    pub fn by_id(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    /// Blank emails and phones without digits are treated as absent.
    pub fn resolve(&self) -> Option<IdentityMatch> {
        if let Some(id) = self.customer_id {
            return Some(IdentityMatch::CustomerId(id));
        }
        let email = self
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty());
        let phone = self
            .phone
            .as_deref()
            .map(normalize_phone)
            .filter(|p| !p.is_empty());

        if email.is_none() && phone.is_none() {
            return None;
        }
        Some(IdentityMatch::Contact { email, phone })
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_phone(raw: &str) -> String {
    NON_DIGIT.replace_all(raw, "").into_owned()
}
