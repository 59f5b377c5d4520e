use std::sync::Arc;

use crate::domain::customer::{normalize_email, Customer, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::ports::CustomerStore;

/// Find-or-create lookup of customers keyed by normalized email.
pub struct CustomerResolver<S> {
    store: Arc<S>,
}

impl<S: CustomerStore> CustomerResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Looks up a customer by email without creating one.
    pub fn lookup(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        self.store.find_by_email(&normalize_email(email)?)
    }

    /// Returns the customer owning `email`, creating it from `candidate` if
    /// there is none. An existing customer is returned unchanged.
    ///
    /// The create branch goes through the store's atomic insert-unless-exists,
    /// so two checkouts racing on the same email both end up with the row
    /// that won.
    pub fn resolve_or_create(
        &self,
        email: &str,
        candidate: &NewCustomer,
    ) -> Result<Customer, DomainError> {
        let email = normalize_email(email)?;
        if let Some(existing) = self.store.find_by_email(&email)? {
            log::debug!("Resolved existing customer {} for {}", existing.id, email);
            return Ok(existing);
        }

        let mut new_customer = candidate.normalized()?;
        new_customer.email = email;
        let customer = self.store.insert_if_absent(new_customer)?;
        log::info!("Resolved customer {} for {}", customer.id, customer.email);
        Ok(customer)
    }
}
