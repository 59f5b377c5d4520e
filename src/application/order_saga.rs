use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use super::customer_resolver::CustomerResolver;
use crate::domain::customer::Customer;
use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutRequest, NewOrder, NewOrderItem, Order, OrderItem};
use crate::domain::ports::{CustomerStore, OrderNotifier, OrderStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Start,
    ResolvingCustomer,
    CreatingOrder,
    CreatingItems,
    Complete,
    Failed,
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SagaState::Start => "validating checkout",
            SagaState::ResolvingCustomer => "resolving customer",
            SagaState::CreatingOrder => "creating order",
            SagaState::CreatingItems => "creating order items",
            SagaState::Complete => "complete",
            SagaState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why an order could not be placed. `stage` is the step that failed.
#[derive(Debug, Error)]
#[error("Order placement failed while {stage}: {source}")]
pub struct PlacementError {
    pub stage: SagaState,
    #[source]
    pub source: DomainError,
}

impl PlacementError {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// True when an earlier placement with the same idempotency key was
    /// returned instead of writing a new order.
    pub replayed: bool,
}

/// Turns a checkout into a customer, an order and its items.
///
/// Order and items are written as one unit: if the items cannot be written
/// the order row is deleted again before the failure is reported.
pub struct OrderPlacementSaga<C, O> {
    customers: CustomerResolver<C>,
    orders: Arc<O>,
    notifier: Arc<dyn OrderNotifier>,
}

impl<C: CustomerStore, O: OrderStore> OrderPlacementSaga<C, O> {
    pub fn new(customers: Arc<C>, orders: Arc<O>, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self {
            customers: CustomerResolver::new(customers),
            orders,
            notifier,
        }
    }

    pub fn place_order(&self, request: CheckoutRequest) -> Result<PlacedOrder, PlacementError> {
        let mut state = SagaState::Start;
        request.validate().map_err(|e| failed(state, e))?;

        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = self
                .orders
                .find_by_idempotency_key(key)
                .map_err(|e| failed(state, e))?
            {
                return self.replay(existing, &request).map_err(|e| failed(state, e));
            }
        }

        state = advance(state, SagaState::ResolvingCustomer);
        let customer = self
            .customers
            .resolve_or_create(&request.customer.email, &request.customer)
            .map_err(|e| failed(state, e))?;
        let shipping_address =
            shipping_snapshot(&customer, &request).map_err(|e| failed(state, e))?;

        state = advance(state, SagaState::CreatingOrder);
        let new_order = NewOrder {
            customer_id: customer.id,
            total: request.total.clone(),
            currency: request.currency,
            payment_method: request.payment_method.trim().to_string(),
            shipping_address,
            idempotency_key: request.idempotency_key.clone(),
        };
        let order = match self.orders.insert_order(new_order) {
            Ok(order) => order,
            Err(DomainError::Conflict(msg)) => {
                // A concurrent placement with the same key won the insert.
                let existing = match &request.idempotency_key {
                    Some(key) => self
                        .orders
                        .find_by_idempotency_key(key)
                        .map_err(|e| failed(state, e))?,
                    None => None,
                };
                return match existing {
                    Some(existing) => self.replay(existing, &request).map_err(|e| failed(state, e)),
                    None => Err(failed(state, DomainError::Conflict(msg))),
                };
            }
            Err(e) => return Err(failed(state, e)),
        };

        state = advance(state, SagaState::CreatingItems);
        let new_items: Vec<NewOrderItem> = request
            .items
            .iter()
            .map(|item| NewOrderItem {
                order_id: order.id,
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
            })
            .collect();
        let items = match self.orders.insert_items(new_items) {
            Ok(items) => items,
            Err(cause) => return Err(failed(state, self.compensate(order.id, cause))),
        };

        advance(state, SagaState::Complete);
        log::info!(
            "Placed order {} for customer {} ({} items, {})",
            order.id,
            customer.id,
            items.len(),
            order.total_money()
        );
        if let Err(e) = self.notifier.order_placed(&order) {
            log::warn!("Order {} placed but notification failed: {}", order.id, e);
        }

        Ok(PlacedOrder {
            order,
            items,
            replayed: false,
        })
    }

    /// Returns the order an earlier checkout with the same idempotency key
    /// placed, provided it describes the same purchase and is complete.
    fn replay(&self, order: Order, request: &CheckoutRequest) -> Result<PlacedOrder, DomainError> {
        let owner = self.customers.lookup(&request.customer.email)?;
        if order.total != request.total
            || order.currency != request.currency
            || owner.map(|c| c.id) != Some(order.customer_id)
        {
            return Err(DomainError::Conflict(format!(
                "idempotency key {:?} was already used for a different checkout",
                order.idempotency_key
            )));
        }
        let items = self.orders.items_for(order.id)?;
        if items.is_empty() {
            return Err(DomainError::Conflict(format!(
                "order {} is still being placed, retry later",
                order.id
            )));
        }
        log::info!(
            "Returning existing order {} for idempotency key {:?}",
            order.id,
            order.idempotency_key
        );
        Ok(PlacedOrder {
            order,
            items,
            replayed: true,
        })
    }

    fn compensate(&self, order_id: Uuid, cause: DomainError) -> DomainError {
        let compensated = match self.orders.delete_order(order_id) {
            Ok(_) => true,
            Err(e) => {
                log::error!(
                    "Could not remove order {} after its items failed to save: {}",
                    order_id,
                    e
                );
                false
            }
        };
        DomainError::PartialFailure {
            order_id,
            compensated,
            cause: cause.to_string(),
        }
    }
}

fn advance(from: SagaState, to: SagaState) -> SagaState {
    log::debug!("Order placement: {} -> {}", from, to);
    to
}

fn failed(stage: SagaState, source: DomainError) -> PlacementError {
    log::warn!(
        "Order placement: {} -> {} ({})",
        stage,
        SagaState::Failed,
        source
    );
    PlacementError { stage, source }
}

fn shipping_snapshot(customer: &Customer, request: &CheckoutRequest) -> Result<String, DomainError> {
    customer
        .address
        .as_deref()
        .or(request.customer.address.as_deref())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DomainError::Validation("a shipping address is required".into()))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::thread;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::currency::CurrencyCode;
    use crate::domain::customer::{CustomerPatch, NewCustomer};
    use crate::domain::order::{OrderItemInput, OrderStatus};
    use crate::domain::pagination::PageWindow;
    use crate::domain::ports::{Customers, OrderFilter, Orders, ResourceStore};
    use crate::infrastructure::memory_store::InMemoryStore;

    /// Delegates to the in-memory store, failing chosen steps on demand.
    struct FlakyOrders {
        inner: Arc<InMemoryStore>,
        fail_items: AtomicBool,
        fail_delete: AtomicBool,
        fail_insert_order: AtomicBool,
    }

    impl FlakyOrders {
        fn new(inner: Arc<InMemoryStore>) -> Self {
            Self {
                inner,
                fail_items: AtomicBool::new(false),
                fail_delete: AtomicBool::new(false),
                fail_insert_order: AtomicBool::new(false),
            }
        }
    }

    impl OrderStore for FlakyOrders {
        fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError> {
            self.inner.find_by_idempotency_key(key)
        }
        fn insert_order(&self, order: NewOrder) -> Result<Order, DomainError> {
            if self.fail_insert_order.load(Ordering::SeqCst) {
                return Err(DomainError::TransientStore("connection timed out".into()));
            }
            self.inner.insert_order(order)
        }
        fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, DomainError> {
            if self.fail_items.load(Ordering::SeqCst) {
                return Err(DomainError::TransientStore("connection reset".into()));
            }
            self.inner.insert_items(items)
        }
        fn delete_order(&self, id: Uuid) -> Result<bool, DomainError> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(DomainError::TransientStore("connection reset".into()));
            }
            self.inner.delete_order(id)
        }
        fn items_for(&self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
            self.inner.items_for(order_id)
        }
        fn update_status(
            &self,
            id: Uuid,
            from: OrderStatus,
            to: OrderStatus,
        ) -> Result<Option<Order>, DomainError> {
            self.inner.update_status(id, from, to)
        }
    }

    /// Holds `insert_items` open until the test releases it, then fails it.
    struct GatedOrders {
        inner: Arc<InMemoryStore>,
        entered: Barrier,
        release: Barrier,
    }

    impl OrderStore for GatedOrders {
        fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError> {
            self.inner.find_by_idempotency_key(key)
        }
        fn insert_order(&self, order: NewOrder) -> Result<Order, DomainError> {
            self.inner.insert_order(order)
        }
        fn insert_items(&self, _items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, DomainError> {
            self.entered.wait();
            self.release.wait();
            Err(DomainError::TransientStore("connection reset".into()))
        }
        fn delete_order(&self, id: Uuid) -> Result<bool, DomainError> {
            self.inner.delete_order(id)
        }
        fn items_for(&self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
            self.inner.items_for(order_id)
        }
        fn update_status(
            &self,
            id: Uuid,
            from: OrderStatus,
            to: OrderStatus,
        ) -> Result<Option<Order>, DomainError> {
            self.inner.update_status(id, from, to)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        placed: Mutex<Vec<Uuid>>,
        calls: AtomicUsize,
    }

    impl OrderNotifier for RecordingNotifier {
        fn order_placed(&self, order: &Order) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.placed.lock().unwrap().push(order.id);
            Ok(())
        }
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        orders: Arc<FlakyOrders>,
        notifier: Arc<RecordingNotifier>,
        saga: OrderPlacementSaga<InMemoryStore, FlakyOrders>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let orders = Arc::new(FlakyOrders::new(store.clone()));
        let notifier = Arc::new(RecordingNotifier::default());
        let saga = OrderPlacementSaga::new(store.clone(), orders.clone(), notifier.clone());
        Harness {
            store,
            orders,
            notifier,
            saga,
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn checkout(email: &str, items: Vec<(i32, &str)>) -> CheckoutRequest {
        let items: Vec<OrderItemInput> = items
            .into_iter()
            .map(|(quantity, price)| OrderItemInput {
                product_id: Uuid::new_v4(),
                variant_id: None,
                quantity,
                unit_price: dec(price),
            })
            .collect();
        let total = crate::domain::order::items_total(&items);
        CheckoutRequest {
            customer: NewCustomer {
                email: email.into(),
                name: "Chioma Eze".into(),
                address: Some("7 Awolowo Rd, Lagos".into()),
                phone: Some("+234 800 000 0000".into()),
            },
            items,
            total,
            currency: CurrencyCode::NGN,
            payment_method: "card".into(),
            idempotency_key: None,
        }
    }

    fn all_orders(store: &InMemoryStore) -> Vec<Order> {
        ResourceStore::<Orders>::list_page(
            store,
            &OrderFilter::default(),
            PageWindow { offset: 0, limit: 100 },
        )
        .unwrap()
        .rows
    }

    fn customer_total(store: &InMemoryStore) -> i64 {
        ResourceStore::<Customers>::list_page(store, &(), PageWindow { offset: 0, limit: 100 })
            .unwrap()
            .total
    }

    #[test]
    fn places_order_with_items_and_snapshots() {
        let h = harness();
        let placed = h
            .saga
            .place_order(checkout("chioma@example.com", vec![(5, "1000"), (4, "2500"), (6, "750")]))
            .unwrap();

        assert!(!placed.replayed);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.shipping_address, "7 Awolowo Rd, Lagos");
        assert_eq!(placed.items.len(), 3);
        assert_eq!(placed.items.iter().map(|i| i.quantity).sum::<i32>(), 15);
        assert!(placed.items.iter().all(|i| i.order_id == placed.order.id));

        let stored_items = h.store.items_for(placed.order.id).unwrap();
        let sum = stored_items
            .iter()
            .map(|i| &i.unit_price * BigDecimal::from(i.quantity))
            .fold(BigDecimal::from(0), |a, b| a + b);
        assert_eq!(sum, placed.order.total);
        assert_eq!(*h.notifier.placed.lock().unwrap(), vec![placed.order.id]);
    }

    #[test]
    fn existing_customer_is_reused() {
        let h = harness();
        let first = h
            .saga
            .place_order(checkout("chioma@example.com", vec![(1, "500")]))
            .unwrap();
        let customers_before = customer_total(&h.store);

        let second = h
            .saga
            .place_order(checkout("Chioma@Example.com ", vec![(2, "500")]))
            .unwrap();

        assert_eq!(second.order.customer_id, first.order.customer_id);
        assert_eq!(customer_total(&h.store), customers_before);
    }

    #[test]
    fn shipping_address_is_a_snapshot() {
        let h = harness();
        let placed = h
            .saga
            .place_order(checkout("ngozi@example.com", vec![(1, "500")]))
            .unwrap();
        h.store
            .update_customer(
                placed.order.customer_id,
                CustomerPatch {
                    address: Some("New address, Abuja".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        let reloaded = ResourceStore::<Orders>::find_by_id(&*h.store, placed.order.id)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.shipping_address, "7 Awolowo Rd, Lagos");
    }

    #[test]
    fn item_failure_removes_the_order() {
        let h = harness();
        h.orders.fail_items.store(true, Ordering::SeqCst);

        let err = h
            .saga
            .place_order(checkout("chioma@example.com", vec![(1, "500"), (2, "250")]))
            .unwrap_err();

        assert_eq!(err.stage, SagaState::CreatingItems);
        assert!(matches!(
            err.source,
            DomainError::PartialFailure { compensated: true, .. }
        ));
        assert!(all_orders(&h.store).is_empty());
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_compensation_is_reported() {
        let h = harness();
        h.orders.fail_items.store(true, Ordering::SeqCst);
        h.orders.fail_delete.store(true, Ordering::SeqCst);

        let err = h
            .saga
            .place_order(checkout("chioma@example.com", vec![(1, "500")]))
            .unwrap_err();

        assert_eq!(err.kind(), "partial_failure");
        assert!(matches!(
            err.source,
            DomainError::PartialFailure { compensated: false, .. }
        ));
    }

    #[test]
    fn order_insert_failure_is_transient() {
        let h = harness();
        h.orders.fail_insert_order.store(true, Ordering::SeqCst);

        let err = h
            .saga
            .place_order(checkout("chioma@example.com", vec![(1, "500")]))
            .unwrap_err();

        assert_eq!(err.stage, SagaState::CreatingOrder);
        assert_eq!(err.kind(), "transient_store");
        assert!(all_orders(&h.store).is_empty());
    }

    #[test]
    fn invalid_customer_data_fails_while_resolving() {
        let h = harness();
        let err = h
            .saga
            .place_order(checkout("not-an-email", vec![(1, "500")]))
            .unwrap_err();
        assert_eq!(err.stage, SagaState::ResolvingCustomer);
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn mismatched_total_is_rejected_before_any_write() {
        let h = harness();
        let mut request = checkout("chioma@example.com", vec![(2, "500")]);
        request.total = dec("999");

        let err = h.saga.place_order(request).unwrap_err();
        assert_eq!(err.stage, SagaState::Start);
        assert_eq!(err.kind(), "conflict");
        assert_eq!(customer_total(&h.store), 0);
    }

    #[test]
    fn missing_shipping_address_is_rejected() {
        let h = harness();
        let mut request = checkout("sade@example.com", vec![(1, "500")]);
        request.customer.address = None;
        let err = h.saga.place_order(request).unwrap_err();
        assert_eq!(err.stage, SagaState::ResolvingCustomer);
        assert!(matches!(err.source, DomainError::Validation(_)));
    }

    #[test]
    fn idempotency_key_replays_the_first_order() {
        let h = harness();
        let mut request = checkout("chioma@example.com", vec![(3, "100")]);
        request.idempotency_key = Some("cart-42".into());

        let first = h.saga.place_order(request.clone()).unwrap();
        let second = h.saga.place_order(request).unwrap();

        assert!(second.replayed);
        assert_eq!(second.order.id, first.order.id);
        assert_eq!(second.items.len(), 1);
        assert_eq!(all_orders(&h.store).len(), 1);
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeated_key_replays_the_first_order() {
        let h = harness();
        let mut request = checkout("chioma@example.com", vec![(2, "500")]);
        request.idempotency_key = Some("cart-41".into());

        let first = h.saga.place_order(request.clone()).unwrap();
        let again = h.saga.place_order(request).unwrap();

        assert!(again.replayed);
        assert_eq!(again.order.id, first.order.id);
        assert_eq!(again.items.len(), 1);
        assert_eq!(all_orders(&h.store).len(), 1);
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reused_key_with_a_different_checkout_conflicts() {
        let h = harness();
        let mut request = checkout("chioma@example.com", vec![(2, "500")]);
        request.idempotency_key = Some("cart-42".into());
        h.saga.place_order(request).unwrap();

        let mut other_cart = checkout("chioma@example.com", vec![(3, "500")]);
        other_cart.idempotency_key = Some("cart-42".into());
        let err = h.saga.place_order(other_cart).unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let mut other_customer = checkout("bisi@example.com", vec![(2, "500")]);
        other_customer.idempotency_key = Some("cart-42".into());
        let err = h.saga.place_order(other_customer).unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(all_orders(&h.store).len(), 1);
    }

    #[test]
    fn retry_while_items_are_being_written_is_not_replayed() {
        let store = Arc::new(InMemoryStore::new());
        let orders = Arc::new(GatedOrders {
            inner: store.clone(),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        });
        let saga = Arc::new(OrderPlacementSaga::new(
            store.clone(),
            orders.clone(),
            Arc::new(RecordingNotifier::default()),
        ));
        let mut request = checkout("chioma@example.com", vec![(1, "500")]);
        request.idempotency_key = Some("cart-43".into());

        let first = {
            let saga = saga.clone();
            let request = request.clone();
            thread::spawn(move || saga.place_order(request))
        };
        orders.entered.wait();
        let retry = saga.place_order(request);
        orders.release.wait();
        let first = first.join().unwrap();

        let err = retry.unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert!(matches!(
            first.unwrap_err().source,
            DomainError::PartialFailure { compensated: true, .. }
        ));
        assert!(all_orders(&store).is_empty());
    }

    #[test]
    fn overlong_customer_email_is_invalid_not_transient() {
        let h = harness();
        let email = format!("{}@example.com", "a".repeat(300));
        let err = h.saga.place_order(checkout(&email, vec![(1, "500")])).unwrap_err();
        assert_eq!(err.stage, SagaState::ResolvingCustomer);
        assert_eq!(err.kind(), "validation");
        assert_eq!(customer_total(&h.store), 0);
    }
}
