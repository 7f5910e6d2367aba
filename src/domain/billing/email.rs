//! Email address used as the record key.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// Normalized customer email, the unique key of a `UserRecord`.
///
/// Trimmed and lowercased so that the provider's and the caller's spelling of
/// the same address land on one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("email", "Email is required"));
        }
        match normalized.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(normalized))
            }
            _ => Err(DomainError::validation("email", "Email must contain '@'")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let email = Email::parse("  A@X.com ").unwrap();
        assert_eq!(email.as_str(), "a@x.com");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(Email::parse("   ").is_err());
    }

    #[test]
    fn parse_rejects_missing_at() {
        assert!(Email::parse("not-an-email").is_err());
        assert!(Email::parse("@x.com").is_err());
        assert!(Email::parse("a@").is_err());
    }
}
