use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::{check_length, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: Uuid,
    /// Always stored normalized; see [`normalize_email`].
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer details captured at checkout.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Admin edit of a customer's contact details. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 50;

impl CustomerPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.phone.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::Validation("nothing to update".into()));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("customer name is required".into()));
            }
            check_length("name", name.trim(), MAX_NAME_LEN)?;
        }
        if let Some(phone) = &self.phone {
            check_length("phone", phone.trim(), MAX_PHONE_LEN)?;
        }
        Ok(())
    }
}

/// Trims and lower-cases an email, rejecting anything without a local part
/// and a domain.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            check_length("email", &email, MAX_EMAIL_LEN)?;
            Ok(email)
        }
        _ => Err(DomainError::Validation(format!(
            "'{}' is not a valid email address",
            raw.trim()
        ))),
    }
}

impl NewCustomer {
    /// Returns a copy with a normalized email and trimmed optional fields.
    pub fn normalized(&self) -> Result<NewCustomer, DomainError> {
        let email = normalize_email(&self.email)?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::Validation("customer name is required".into()));
        }
        check_length("name", &name, MAX_NAME_LEN)?;
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let phone = non_blank(&self.phone);
        if let Some(phone) = &phone {
            check_length("phone", phone, MAX_PHONE_LEN)?;
        }
        Ok(NewCustomer {
            email,
            name,
            address: non_blank(&self.address),
            phone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(
            normalize_email("  Ada.Obi@Example.COM ").unwrap(),
            "ada.obi@example.com"
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "   ", "no-at", "@example.com", "ada@", "a@b@c"] {
            assert!(
                matches!(normalize_email(bad), Err(DomainError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn normalized_candidate_drops_blank_optionals() {
        let candidate = NewCustomer {
            email: "KOFI@example.com".into(),
            name: " Kofi Mensah ".into(),
            address: Some("   ".into()),
            phone: Some(" 0244 000 000 ".into()),
        };
        let normalized = candidate.normalized().unwrap();
        assert_eq!(normalized.email, "kofi@example.com");
        assert_eq!(normalized.name, "Kofi Mensah");
        assert_eq!(normalized.address, None);
        assert_eq!(normalized.phone.as_deref(), Some("0244 000 000"));
    }

    #[test]
    fn candidate_requires_name() {
        let candidate = NewCustomer {
            email: "kofi@example.com".into(),
            name: "".into(),
            address: None,
            phone: None,
        };
        assert!(candidate.normalized().is_err());
    }

    #[test]
    fn overlong_fields_are_invalid() {
        let long_email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(matches!(normalize_email(&long_email), Err(DomainError::Validation(_))));

        let candidate = NewCustomer {
            email: "kofi@example.com".into(),
            name: "Kofi".into(),
            address: None,
            phone: Some("0".repeat(MAX_PHONE_LEN + 1)),
        };
        assert!(matches!(candidate.normalized(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_validation() {
        assert!(CustomerPatch::default().validate().is_err());
        let blank_name = CustomerPatch {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
        let long_name = CustomerPatch {
            name: Some("n".repeat(MAX_NAME_LEN + 1)),
            ..Default::default()
        };
        assert!(matches!(long_name.validate(), Err(DomainError::Validation(_))));
        let address_only = CustomerPatch {
            address: Some("9 Ring Rd, Accra".into()),
            ..Default::default()
        };
        assert!(address_only.validate().is_ok());
    }
}
