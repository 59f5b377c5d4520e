use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::catalog::{
    Category, NewCategory, NewProduct, NewSubcategory, NewVariant, Product, ProductVariant,
    Subcategory,
};
use crate::domain::customer::{Customer, CustomerPatch, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
use crate::domain::pagination::{Page, PageWindow};
use crate::domain::ports::{
    CatalogStore, Categories, CustomerStore, Customers, OrderFilter, OrderStore, Orders,
    ProductFilter, Products, ResourceStore, SubcategoryFilter, Subcategories, VariantFilter,
    Variants,
};

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    variants: Vec<ProductVariant>,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// Process-local store with the same constraints as the PostgreSQL schema:
/// unique customer emails, unique idempotency keys and cascading deletes.
/// Used by the test suites and for running the API without a database.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DomainError> {
        self.tables
            .lock()
            .map_err(|_| DomainError::TransientStore("in-memory store lock poisoned".into()))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T: Clone>(matches: Vec<&T>, window: PageWindow) -> Page<T> {
    let total = matches.len() as i64;
    let rows = matches
        .into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .cloned()
        .collect();
    Page { rows, total }
}

fn by_sort_order<T>(rows: &mut [&T], key: impl Fn(&T) -> (i32, &str)) {
    rows.sort_by(|a, b| key(a).cmp(&key(b)));
}

fn product_matches(p: &Product, filter: &ProductFilter) -> bool {
    filter.category_id.map_or(true, |id| p.category_id == Some(id))
        && filter.subcategory_id.map_or(true, |id| p.subcategory_id == Some(id))
        && (!filter.active_only || p.is_active)
}

fn order_matches(o: &Order, filter: &OrderFilter) -> bool {
    filter.status.map_or(true, |s| o.status == s)
        && filter.customer_id.map_or(true, |id| o.customer_id == id)
}

impl InMemoryStore {
    fn products_page(
        &self,
        term: Option<&str>,
        filter: &ProductFilter,
        window: PageWindow,
    ) -> Result<Page<Product>, DomainError> {
        let tables = self.tables()?;
        let mut rows: Vec<&Product> = tables
            .products
            .iter()
            .filter(|p| product_matches(p, filter))
            .filter(|p| term.map_or(true, |t| contains_ci(&p.name, t)))
            .collect();
        by_sort_order(&mut rows, |p| (p.sort_order, p.name.as_str()));
        Ok(paginate(rows, window))
    }

    fn variants_page(
        &self,
        term: Option<&str>,
        filter: &VariantFilter,
        window: PageWindow,
    ) -> Result<Page<ProductVariant>, DomainError> {
        let tables = self.tables()?;
        let mut rows: Vec<&ProductVariant> = tables
            .variants
            .iter()
            .filter(|v| filter.product_id.map_or(true, |id| v.product_id == id))
            .filter(|v| term.map_or(true, |t| contains_ci(&v.name, t)))
            .collect();
        by_sort_order(&mut rows, |v| (v.sort_order, v.name.as_str()));
        Ok(paginate(rows, window))
    }

    fn categories_page(&self, term: Option<&str>, window: PageWindow) -> Result<Page<Category>, DomainError> {
        let tables = self.tables()?;
        let mut rows: Vec<&Category> = tables
            .categories
            .iter()
            .filter(|c| term.map_or(true, |t| contains_ci(&c.name, t)))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(rows, window))
    }

    fn subcategories_page(
        &self,
        term: Option<&str>,
        filter: &SubcategoryFilter,
        window: PageWindow,
    ) -> Result<Page<Subcategory>, DomainError> {
        let tables = self.tables()?;
        let mut rows: Vec<&Subcategory> = tables
            .subcategories
            .iter()
            .filter(|s| filter.category_id.map_or(true, |id| s.category_id == id))
            .filter(|s| term.map_or(true, |t| contains_ci(&s.name, t)))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(rows, window))
    }

    fn customers_page(&self, term: Option<&str>, window: PageWindow) -> Result<Page<Customer>, DomainError> {
        let tables = self.tables()?;
        let rows: Vec<&Customer> = tables
            .customers
            .iter()
            .rev()
            .filter(|c| term.map_or(true, |t| contains_ci(&c.name, t) || contains_ci(&c.email, t)))
            .collect();
        Ok(paginate(rows, window))
    }

    fn orders_page(
        &self,
        term: Option<&str>,
        filter: &OrderFilter,
        window: PageWindow,
    ) -> Result<Page<Order>, DomainError> {
        let tables = self.tables()?;
        let rows: Vec<&Order> = tables
            .orders
            .iter()
            .rev()
            .filter(|o| order_matches(o, filter))
            .filter(|o| term.map_or(true, |t| contains_ci(&o.id.to_string(), t)))
            .collect();
        Ok(paginate(rows, window))
    }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: Uuid, id_of: impl Fn(&T) -> Uuid) -> bool {
    let before = rows.len();
    rows.retain(|r| id_of(r) != id);
    rows.len() != before
}

impl ResourceStore<Products> for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.tables()?.products.iter().find(|p| p.id == id).cloned())
    }
    fn list_page(&self, filter: &ProductFilter, window: PageWindow) -> Result<Page<Product>, DomainError> {
        self.products_page(None, filter, window)
    }
    fn search_page(&self, term: &str, filter: &ProductFilter, window: PageWindow) -> Result<Page<Product>, DomainError> {
        self.products_page(Some(term), filter, window)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables()?;
        let deleted = remove_by_id(&mut tables.products, id, |p| p.id);
        if deleted {
            tables.variants.retain(|v| v.product_id != id);
        }
        Ok(deleted)
    }
}

impl ResourceStore<Variants> for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductVariant>, DomainError> {
        Ok(self.tables()?.variants.iter().find(|v| v.id == id).cloned())
    }
    fn list_page(&self, filter: &VariantFilter, window: PageWindow) -> Result<Page<ProductVariant>, DomainError> {
        self.variants_page(None, filter, window)
    }
    fn search_page(
        &self,
        term: &str,
        filter: &VariantFilter,
        window: PageWindow,
    ) -> Result<Page<ProductVariant>, DomainError> {
        self.variants_page(Some(term), filter, window)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(remove_by_id(&mut self.tables()?.variants, id, |v| v.id))
    }
}

impl ResourceStore<Categories> for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self.tables()?.categories.iter().find(|c| c.id == id).cloned())
    }
    fn list_page(&self, _filter: &(), window: PageWindow) -> Result<Page<Category>, DomainError> {
        self.categories_page(None, window)
    }
    fn search_page(&self, term: &str, _filter: &(), window: PageWindow) -> Result<Page<Category>, DomainError> {
        self.categories_page(Some(term), window)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables()?;
        let deleted = remove_by_id(&mut tables.categories, id, |c| c.id);
        if deleted {
            let orphaned: Vec<Uuid> = tables
                .subcategories
                .iter()
                .filter(|s| s.category_id == id)
                .map(|s| s.id)
                .collect();
            tables.subcategories.retain(|s| s.category_id != id);
            for product in tables.products.iter_mut() {
                if product.category_id == Some(id) {
                    product.category_id = None;
                }
                if product.subcategory_id.is_some_and(|s| orphaned.contains(&s)) {
                    product.subcategory_id = None;
                }
            }
        }
        Ok(deleted)
    }
}

impl ResourceStore<Subcategories> for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, DomainError> {
        Ok(self.tables()?.subcategories.iter().find(|s| s.id == id).cloned())
    }
    fn list_page(&self, filter: &SubcategoryFilter, window: PageWindow) -> Result<Page<Subcategory>, DomainError> {
        self.subcategories_page(None, filter, window)
    }
    fn search_page(
        &self,
        term: &str,
        filter: &SubcategoryFilter,
        window: PageWindow,
    ) -> Result<Page<Subcategory>, DomainError> {
        self.subcategories_page(Some(term), filter, window)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables()?;
        let deleted = remove_by_id(&mut tables.subcategories, id, |s| s.id);
        if deleted {
            for product in tables.products.iter_mut() {
                if product.subcategory_id == Some(id) {
                    product.subcategory_id = None;
                }
            }
        }
        Ok(deleted)
    }
}

impl ResourceStore<Customers> for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.tables()?.customers.iter().find(|c| c.id == id).cloned())
    }
    fn list_page(&self, _filter: &(), window: PageWindow) -> Result<Page<Customer>, DomainError> {
        self.customers_page(None, window)
    }
    fn search_page(&self, term: &str, _filter: &(), window: PageWindow) -> Result<Page<Customer>, DomainError> {
        self.customers_page(Some(term), window)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables()?;
        if tables.orders.iter().any(|o| o.customer_id == id) {
            return Err(DomainError::Conflict(format!(
                "customer {id} still has orders"
            )));
        }
        Ok(remove_by_id(&mut tables.customers, id, |c| c.id))
    }
}

impl ResourceStore<Orders> for InMemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.tables()?.orders.iter().find(|o| o.id == id).cloned())
    }
    fn list_page(&self, filter: &OrderFilter, window: PageWindow) -> Result<Page<Order>, DomainError> {
        self.orders_page(None, filter, window)
    }
    fn search_page(&self, term: &str, filter: &OrderFilter, window: PageWindow) -> Result<Page<Order>, DomainError> {
        self.orders_page(Some(term), filter, window)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        self.delete_order(id)
    }
}

impl CustomerStore for InMemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .tables()?
            .customers
            .iter()
            .find(|c| c.email == email)
            .cloned())
    }

    fn insert_if_absent(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.customers.iter().find(|c| c.email == customer.email) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let row = Customer {
            id: Uuid::new_v4(),
            email: customer.email,
            name: customer.name,
            address: customer.address,
            phone: customer.phone,
            created_at: now,
            updated_at: now,
        };
        tables.customers.push(row.clone());
        Ok(row)
    }

    fn update_customer(&self, id: Uuid, patch: CustomerPatch) -> Result<Option<Customer>, DomainError> {
        let mut tables = self.tables()?;
        let Some(customer) = tables.customers.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            customer.name = name;
        }
        if let Some(address) = patch.address {
            customer.address = Some(address);
        }
        if let Some(phone) = patch.phone {
            customer.phone = Some(phone);
        }
        customer.updated_at = Utc::now();
        Ok(Some(customer.clone()))
    }
}

impl OrderStore for InMemoryStore {
    fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError> {
        Ok(self
            .tables()?
            .orders
            .iter()
            .find(|o| o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    fn insert_order(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut tables = self.tables()?;
        if let Some(key) = &order.idempotency_key {
            if tables
                .orders
                .iter()
                .any(|o| o.idempotency_key.as_ref() == Some(key))
            {
                return Err(DomainError::Conflict(format!(
                    "an order with idempotency key '{key}' already exists"
                )));
            }
        }
        let now = Utc::now();
        let row = Order {
            id: Uuid::new_v4(),
            customer_id: order.customer_id,
            total: order.total,
            currency: order.currency,
            status: OrderStatus::Pending,
            payment_method: order.payment_method,
            shipping_address: order.shipping_address,
            idempotency_key: order.idempotency_key,
            created_at: now,
            updated_at: now,
        };
        tables.orders.push(row.clone());
        Ok(row)
    }

    fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, DomainError> {
        let mut tables = self.tables()?;
        if let Some(orphan) = items
            .iter()
            .find(|i| !tables.orders.iter().any(|o| o.id == i.order_id))
        {
            return Err(DomainError::Conflict(format!(
                "order {} does not exist",
                orphan.order_id
            )));
        }
        let now = Utc::now();
        let rows: Vec<OrderItem> = items
            .into_iter()
            .map(|i| OrderItem {
                id: Uuid::new_v4(),
                order_id: i.order_id,
                product_id: i.product_id,
                variant_id: i.variant_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
                created_at: now,
            })
            .collect();
        tables.order_items.extend(rows.iter().cloned());
        Ok(rows)
    }

    fn delete_order(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables()?;
        let deleted = remove_by_id(&mut tables.orders, id, |o| o.id);
        tables.order_items.retain(|i| i.order_id != id);
        Ok(deleted)
    }

    fn items_for(&self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
        Ok(self
            .tables()?
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut tables = self.tables()?;
        let Some(order) = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == from)
        else {
            return Ok(None);
        };
        order.status = to;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

impl CatalogStore for InMemoryStore {
    fn insert_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        let row = Category {
            id: Uuid::new_v4(),
            name: category.name,
            description: category.description,
            created_at: Utc::now(),
        };
        self.tables()?.categories.push(row.clone());
        Ok(row)
    }

    fn insert_subcategory(&self, subcategory: NewSubcategory) -> Result<Subcategory, DomainError> {
        let mut tables = self.tables()?;
        if !tables.categories.iter().any(|c| c.id == subcategory.category_id) {
            return Err(DomainError::Conflict(format!(
                "category {} does not exist",
                subcategory.category_id
            )));
        }
        let row = Subcategory {
            id: Uuid::new_v4(),
            category_id: subcategory.category_id,
            name: subcategory.name,
            description: subcategory.description,
            created_at: Utc::now(),
        };
        tables.subcategories.push(row.clone());
        Ok(row)
    }

    fn insert_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let now = Utc::now();
        let row = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            category_id: product.category_id,
            subcategory_id: product.subcategory_id,
            pricing: product.pricing,
            stock: product.stock,
            is_active: product.is_active,
            sort_order: product.sort_order,
            images: product.images,
            created_at: now,
            updated_at: now,
        };
        self.tables()?.products.push(row.clone());
        Ok(row)
    }

    fn insert_variant(&self, variant: NewVariant) -> Result<ProductVariant, DomainError> {
        let mut tables = self.tables()?;
        if !tables.products.iter().any(|p| p.id == variant.product_id) {
            return Err(DomainError::Conflict(format!(
                "product {} does not exist",
                variant.product_id
            )));
        }
        let now = Utc::now();
        let row = ProductVariant {
            id: Uuid::new_v4(),
            product_id: variant.product_id,
            name: variant.name,
            description: variant.description,
            pricing: variant.pricing,
            stock: variant.stock,
            is_active: variant.is_active,
            sort_order: variant.sort_order,
            images: variant.images,
            created_at: now,
            updated_at: now,
        };
        tables.variants.push(row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::catalog::ItemPricing;
    use crate::domain::currency::CurrencyCode;

    fn window(offset: i64, limit: i64) -> PageWindow {
        PageWindow { offset, limit }
    }

    fn new_order(key: Option<&str>) -> NewOrder {
        NewOrder {
            customer_id: Uuid::new_v4(),
            total: BigDecimal::from(10),
            currency: CurrencyCode::USD,
            payment_method: "transfer".into(),
            shipping_address: "3 Ring Rd, Kumasi".into(),
            idempotency_key: key.map(str::to_string),
        }
    }

    #[test]
    fn duplicate_idempotency_key_conflicts() {
        let store = InMemoryStore::new();
        store.insert_order(new_order(Some("k1"))).unwrap();
        assert!(matches!(
            store.insert_order(new_order(Some("k1"))),
            Err(DomainError::Conflict(_))
        ));
        store.insert_order(new_order(None)).unwrap();
        store.insert_order(new_order(None)).unwrap();
    }

    #[test]
    fn items_require_an_existing_order() {
        let store = InMemoryStore::new();
        let result = store.insert_items(vec![NewOrderItem {
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            variant_id: None,
            quantity: 1,
            unit_price: BigDecimal::from(1),
        }]);
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn status_update_requires_the_expected_status() {
        let store = InMemoryStore::new();
        let order = store.insert_order(new_order(None)).unwrap();

        let moved = store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Processing)
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, OrderStatus::Processing);

        // A second admin still working from the pending row.
        assert!(store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .unwrap()
            .is_none());
        let current = ResourceStore::<Orders>::find_by_id(&store, order.id).unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Processing);
    }

    #[test]
    fn search_by_order_id_substring() {
        let store = InMemoryStore::new();
        let order = store.insert_order(new_order(None)).unwrap();
        store.insert_order(new_order(None)).unwrap();
        let fragment = &order.id.to_string()[..8];

        let page = ResourceStore::<Orders>::search_page(
            &store,
            &fragment.to_uppercase(),
            &OrderFilter::default(),
            window(0, 10),
        )
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].id, order.id);
    }

    #[test]
    fn customers_with_orders_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let customer = store
            .insert_if_absent(NewCustomer {
                email: "yaw@example.com".into(),
                name: "Yaw".into(),
                address: None,
                phone: None,
            })
            .unwrap();
        let mut order = new_order(None);
        order.customer_id = customer.id;
        store.insert_order(order).unwrap();

        assert!(matches!(
            ResourceStore::<Customers>::delete(&store, customer.id),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn deleting_a_category_detaches_products() {
        let store = InMemoryStore::new();
        let category = store
            .insert_category(NewCategory {
                name: "Home".into(),
                description: None,
            })
            .unwrap();
        let product = store
            .insert_product(NewProduct {
                name: "Raffia basket".into(),
                description: None,
                category_id: Some(category.id),
                subcategory_id: None,
                pricing: ItemPricing {
                    base_price: Some(BigDecimal::from(15)),
                    ..Default::default()
                },
                stock: 2,
                is_active: true,
                sort_order: 0,
                images: vec![],
            })
            .unwrap();

        assert!(ResourceStore::<Categories>::delete(&store, category.id).unwrap());
        let reloaded = ResourceStore::<Products>::find_by_id(&store, product.id)
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.category_id, None);
    }

    #[test]
    fn product_filter_and_window() {
        let store = InMemoryStore::new();
        for (i, active) in [true, false, true, true].into_iter().enumerate() {
            store
                .insert_product(NewProduct {
                    name: format!("Bead necklace {i}"),
                    description: None,
                    category_id: None,
                    subcategory_id: None,
                    pricing: ItemPricing {
                        price_ngn: Some(BigDecimal::from(2000)),
                        ..Default::default()
                    },
                    stock: 1,
                    is_active: active,
                    sort_order: 0,
                    images: vec![],
                })
                .unwrap();
        }
        let filter = ProductFilter {
            active_only: true,
            ..Default::default()
        };
        let page = ResourceStore::<Products>::list_page(&store, &filter, window(2, 2)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "Bead necklace 3");
    }
}
