pub mod admin_service;
pub mod customer_resolver;
pub mod order_saga;
pub mod price_quote;
pub mod query_service;

use std::sync::Arc;

use crate::domain::ports::{
    CatalogStore, Categories, CustomerStore, Customers, OrderNotifier, OrderStore, Orders,
    Products, ResourceStore, Subcategories, Variants,
};
use crate::domain::pricing::PriceResolver;

use admin_service::AdminService;
use order_saga::OrderPlacementSaga;
use price_quote::PriceQuoteService;
use query_service::ResourceQueryService;

/// Everything a single backend must provide to run the whole application.
pub trait Store:
    CatalogStore
    + CustomerStore
    + OrderStore
    + ResourceStore<Products>
    + ResourceStore<Variants>
    + ResourceStore<Categories>
    + ResourceStore<Subcategories>
    + ResourceStore<Customers>
    + ResourceStore<Orders>
{
}

impl<T> Store for T where
    T: CatalogStore
        + CustomerStore
        + OrderStore
        + ResourceStore<Products>
        + ResourceStore<Variants>
        + ResourceStore<Categories>
        + ResourceStore<Subcategories>
        + ResourceStore<Customers>
        + ResourceStore<Orders>
{
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Services shared by every request handler.
pub struct AppState<S> {
    pub queries: ResourceQueryService<S>,
    pub saga: OrderPlacementSaga<S, S>,
    pub admin: AdminService<S>,
    pub prices: PriceQuoteService<S>,
    pub limits: PageLimits,
}

impl<S: Store> AppState<S> {
    pub fn new(
        store: Arc<S>,
        notifier: Arc<dyn OrderNotifier>,
        resolver: PriceResolver,
        limits: PageLimits,
    ) -> Self {
        Self {
            queries: ResourceQueryService::new(store.clone(), limits.max_limit),
            saga: OrderPlacementSaga::new(store.clone(), store.clone(), notifier),
            admin: AdminService::new(store.clone()),
            prices: PriceQuoteService::new(store, resolver),
            limits,
        }
    }
}
