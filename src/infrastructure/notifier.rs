use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::OrderNotifier;

/// Announces placed orders on the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn order_placed(&self, order: &Order) -> Result<(), DomainError> {
        log::info!(
            "New order {} from customer {}: {} via {}",
            order.id,
            order.customer_id,
            order.total_money(),
            order.payment_method
        );
        Ok(())
    }
}
