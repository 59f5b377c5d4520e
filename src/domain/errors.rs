use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    TransientStore(String),
    /// The order row was written but its items were not. `compensated` tells
    /// whether the order row was removed again.
    #[error("Order {order_id} created without items (compensated: {compensated}): {cause}")]
    PartialFailure {
        order_id: Uuid,
        compensated: bool,
        cause: String,
    },
}

impl DomainError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::NotFound => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::TransientStore(_) => "transient_store",
            DomainError::PartialFailure { .. } => "partial_failure",
        }
    }
}

/// Rejects `value` when it has more than `max` characters, the width of the
/// column it is stored in.
pub fn check_length(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}
