use std::fmt::Debug;

use serde::Serialize;
use uuid::Uuid;

use super::catalog::{
    Category, NewCategory, NewProduct, NewSubcategory, NewVariant, Product, ProductVariant,
    Subcategory,
};
use super::customer::{Customer, CustomerPatch, NewCustomer};
use super::errors::DomainError;
use super::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
use super::pagination::{Page, PageWindow};

/// Column a free-text search is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    NameOrEmail,
    IdSubstring,
}

/// Per-resource listing strategy: the record type, how it may be filtered
/// and which field a search term is matched against.
pub trait Resource: Send + Sync + 'static {
    type Record: Clone + Debug + Serialize + Send + Sync + 'static;
    type Filter: Clone + Debug + Default + Send + Sync + 'static;

    const NAME: &'static str;
    const SEARCH_FIELD: SearchField;
}

pub struct Products;
pub struct Variants;
pub struct Categories;
pub struct Subcategories;
pub struct Customers;
pub struct Orders;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub active_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VariantFilter {
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct SubcategoryFilter {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

impl Resource for Products {
    type Record = Product;
    type Filter = ProductFilter;
    const NAME: &'static str = "products";
    const SEARCH_FIELD: SearchField = SearchField::Name;
}

impl Resource for Variants {
    type Record = ProductVariant;
    type Filter = VariantFilter;
    const NAME: &'static str = "variants";
    const SEARCH_FIELD: SearchField = SearchField::Name;
}

impl Resource for Categories {
    type Record = Category;
    type Filter = ();
    const NAME: &'static str = "categories";
    const SEARCH_FIELD: SearchField = SearchField::Name;
}

impl Resource for Subcategories {
    type Record = Subcategory;
    type Filter = SubcategoryFilter;
    const NAME: &'static str = "subcategories";
    const SEARCH_FIELD: SearchField = SearchField::Name;
}

impl Resource for Customers {
    type Record = Customer;
    type Filter = ();
    const NAME: &'static str = "customers";
    const SEARCH_FIELD: SearchField = SearchField::NameOrEmail;
}

impl Resource for Orders {
    type Record = Order;
    type Filter = OrderFilter;
    const NAME: &'static str = "orders";
    const SEARCH_FIELD: SearchField = SearchField::IdSubstring;
}

/// Read and delete access to one resource type.
///
/// Both page queries return the exact number of matching rows across the
/// whole resource set, independent of the requested window.
pub trait ResourceStore<R: Resource>: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<R::Record>, DomainError>;
    fn list_page(&self, filter: &R::Filter, window: PageWindow) -> Result<Page<R::Record>, DomainError>;
    fn search_page(
        &self,
        term: &str,
        filter: &R::Filter,
        window: PageWindow,
    ) -> Result<Page<R::Record>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait CustomerStore: Send + Sync + 'static {
    fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError>;
    /// Atomic insert-unless-exists on the (normalized) email. Returns the row
    /// that owns the email afterwards, whether it was just created or not.
    fn insert_if_absent(&self, customer: NewCustomer) -> Result<Customer, DomainError>;
    fn update_customer(&self, id: Uuid, patch: CustomerPatch) -> Result<Option<Customer>, DomainError>;
}

pub trait OrderStore: Send + Sync + 'static {
    fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError>;
    fn insert_order(&self, order: NewOrder) -> Result<Order, DomainError>;
    /// All-or-nothing batch insert.
    fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, DomainError>;
    /// Removes an order together with any items it owns.
    fn delete_order(&self, id: Uuid) -> Result<bool, DomainError>;
    fn items_for(&self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError>;
    /// Moves the order to `to` only if it is still in `from`. `None` when no
    /// order with `id` is in `from`.
    fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, DomainError>;
}

pub trait CatalogStore: Send + Sync + 'static {
    fn insert_category(&self, category: NewCategory) -> Result<Category, DomainError>;
    fn insert_subcategory(&self, subcategory: NewSubcategory) -> Result<Subcategory, DomainError>;
    fn insert_product(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn insert_variant(&self, variant: NewVariant) -> Result<ProductVariant, DomainError>;
}

/// Told about orders after they are fully placed.
pub trait OrderNotifier: Send + Sync + 'static {
    fn order_placed(&self, order: &Order) -> Result<(), DomainError>;
}
