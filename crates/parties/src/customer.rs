use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradebook_core::{CustomerId, DomainError, DomainResult, TenantId};

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<String>,
}

/// Validated input for creating or updating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub contact: ContactInfo,
}

/// A customer directory entry.
///
/// Customers are created once, referenced by invoices via foreign key, and
/// never concurrently mutated in a way that threatens an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    tenant_id: TenantId,
    name: String,
    contact: ContactInfo,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    /// Validate a draft into a customer owned by `tenant_id`.
    pub fn create(
        tenant_id: TenantId,
        id: CustomerId,
        draft: CustomerDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let (name, contact) = validate_draft(draft)?;
        Ok(Self {
            id,
            tenant_id,
            name,
            contact,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an update draft (name + contact details).
    pub fn update(&mut self, draft: CustomerDraft, now: DateTime<Utc>) -> DomainResult<()> {
        let (name, contact) = validate_draft(draft)?;
        self.name = name;
        self.contact = contact;
        self.updated_at = now;
        Ok(())
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_draft(draft: CustomerDraft) -> DomainResult<(String, ContactInfo)> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }

    if let Some(email) = draft.contact.email.as_deref() {
        validate_email(email)?;
    }

    Ok((name.to_string(), draft.contact))
}

/// Shape check only: `local@domain` with a dot in the domain part.
/// Deliverability is not a domain concern.
fn validate_email(email: &str) -> DomainResult<()> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::validation("email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err(DomainError::validation("email is malformed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: Option<&str>) -> CustomerDraft {
        CustomerDraft {
            name: name.to_string(),
            contact: ContactInfo {
                email: email.map(str::to_string),
                phone: None,
                billing_address: None,
            },
        }
    }

    #[test]
    fn create_rejects_blank_name() {
        let err = Customer::create(TenantId::new(), CustomerId::new(), draft("  ", None), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_accepts_valid_email() {
        let customer = Customer::create(
            TenantId::new(),
            CustomerId::new(),
            draft("Acme Supplies", Some("billing@acme.example")),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(customer.contact().email.as_deref(), Some("billing@acme.example"));
    }

    #[test]
    fn create_rejects_malformed_email() {
        for bad in ["no-at-sign", "@nodomain", "local@", "spaces in@domain.example", "x@nodot"] {
            let result = Customer::create(
                TenantId::new(),
                CustomerId::new(),
                draft("Acme Supplies", Some(bad)),
                Utc::now(),
            );
            assert!(result.is_err(), "expected {bad:?} to be rejected");
        }
    }

    #[test]
    fn update_replaces_name_and_contact() {
        let mut customer = Customer::create(
            TenantId::new(),
            CustomerId::new(),
            draft("Old Name", None),
            Utc::now(),
        )
        .unwrap();

        customer
            .update(draft("New Name", Some("new@example.com")), Utc::now())
            .unwrap();
        assert_eq!(customer.name(), "New Name");
        assert_eq!(customer.contact().email.as_deref(), Some("new@example.com"));
    }

    #[test]
    fn update_validation_failure_leaves_customer_unchanged() {
        let mut customer = Customer::create(
            TenantId::new(),
            CustomerId::new(),
            draft("Keep Me", None),
            Utc::now(),
        )
        .unwrap();
        let before = customer.clone();

        assert!(customer.update(draft("", None), Utc::now()).is_err());
        assert_eq!(customer, before);
    }
}
