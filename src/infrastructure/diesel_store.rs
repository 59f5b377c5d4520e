use chrono::Utc;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use uuid::Uuid;

use crate::db::DbPool;
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
use crate::schema::{
    categories, customers, order_items, orders, product_variants, products, subcategories,
};

use super::models::{
    CategoryRow, CustomerChangeset, CustomerRow, NewCategoryRow, NewCustomerRow, NewOrderItemRow,
    NewOrderRow, NewProductRow, NewSubcategoryRow, NewVariantRow, OrderItemRow, OrderRow,
    ProductRow, SubcategoryRow, VariantRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => DomainError::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => DomainError::Conflict(info.message().to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                DomainError::Validation(info.message().to_string())
            }
            other => DomainError::TransientStore(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::TransientStore(e.to_string())
    }
}

// ── Query builders ────────────────────────────────────────────────────────────

/// Case-insensitive "contains" pattern with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn products_query(filter: &ProductFilter, term: Option<&str>) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table.into_boxed();
    if let Some(id) = filter.category_id {
        query = query.filter(products::category_id.eq(id));
    }
    if let Some(id) = filter.subcategory_id {
        query = query.filter(products::subcategory_id.eq(id));
    }
    if filter.active_only {
        query = query.filter(products::is_active.eq(true));
    }
    if let Some(term) = term {
        query = query.filter(products::name.ilike(like_pattern(term)));
    }
    query
}

fn variants_query(
    filter: &VariantFilter,
    term: Option<&str>,
) -> product_variants::BoxedQuery<'static, Pg> {
    let mut query = product_variants::table.into_boxed();
    if let Some(id) = filter.product_id {
        query = query.filter(product_variants::product_id.eq(id));
    }
    if let Some(term) = term {
        query = query.filter(product_variants::name.ilike(like_pattern(term)));
    }
    query
}

fn categories_query(term: Option<&str>) -> categories::BoxedQuery<'static, Pg> {
    let mut query = categories::table.into_boxed();
    if let Some(term) = term {
        query = query.filter(categories::name.ilike(like_pattern(term)));
    }
    query
}

fn subcategories_query(
    filter: &SubcategoryFilter,
    term: Option<&str>,
) -> subcategories::BoxedQuery<'static, Pg> {
    let mut query = subcategories::table.into_boxed();
    if let Some(id) = filter.category_id {
        query = query.filter(subcategories::category_id.eq(id));
    }
    if let Some(term) = term {
        query = query.filter(subcategories::name.ilike(like_pattern(term)));
    }
    query
}

fn customers_query(term: Option<&str>) -> customers::BoxedQuery<'static, Pg> {
    let mut query = customers::table.into_boxed();
    if let Some(term) = term {
        let pattern = like_pattern(term);
        query = query.filter(
            customers::name
                .ilike(pattern.clone())
                .or(customers::email.ilike(pattern)),
        );
    }
    query
}

fn orders_query(filter: &OrderFilter, term: Option<&str>) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(id) = filter.customer_id {
        query = query.filter(orders::customer_id.eq(id));
    }
    if let Some(term) = term {
        query = query.filter(sql::<Text>("orders.id::text").ilike(like_pattern(term)));
    }
    query
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// PostgreSQL-backed implementation of every storage port.
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn products_page(
        &self,
        term: Option<&str>,
        filter: &ProductFilter,
        window: PageWindow,
    ) -> Result<Page<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = products_query(filter, term).count().get_result(conn)?;
            let rows = products_query(filter, term)
                .select(ProductRow::as_select())
                .order((products::sort_order.asc(), products::name.asc()))
                .limit(window.limit)
                .offset(window.offset)
                .load(conn)?;
            Ok(Page {
                rows: rows.into_iter().map(Product::from).collect(),
                total,
            })
        })
    }

    fn variants_page(
        &self,
        term: Option<&str>,
        filter: &VariantFilter,
        window: PageWindow,
    ) -> Result<Page<ProductVariant>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = variants_query(filter, term).count().get_result(conn)?;
            let rows = variants_query(filter, term)
                .select(VariantRow::as_select())
                .order((product_variants::sort_order.asc(), product_variants::name.asc()))
                .limit(window.limit)
                .offset(window.offset)
                .load(conn)?;
            Ok(Page {
                rows: rows.into_iter().map(ProductVariant::from).collect(),
                total,
            })
        })
    }

    fn categories_page(
        &self,
        term: Option<&str>,
        window: PageWindow,
    ) -> Result<Page<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = categories_query(term).count().get_result(conn)?;
            let rows = categories_query(term)
                .select(CategoryRow::as_select())
                .order(categories::name.asc())
                .limit(window.limit)
                .offset(window.offset)
                .load(conn)?;
            Ok(Page {
                rows: rows.into_iter().map(Category::from).collect(),
                total,
            })
        })
    }

    fn subcategories_page(
        &self,
        term: Option<&str>,
        filter: &SubcategoryFilter,
        window: PageWindow,
    ) -> Result<Page<Subcategory>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = subcategories_query(filter, term).count().get_result(conn)?;
            let rows = subcategories_query(filter, term)
                .select(SubcategoryRow::as_select())
                .order(subcategories::name.asc())
                .limit(window.limit)
                .offset(window.offset)
                .load(conn)?;
            Ok(Page {
                rows: rows.into_iter().map(Subcategory::from).collect(),
                total,
            })
        })
    }

    fn customers_page(
        &self,
        term: Option<&str>,
        window: PageWindow,
    ) -> Result<Page<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = customers_query(term).count().get_result(conn)?;
            let rows = customers_query(term)
                .select(CustomerRow::as_select())
                .order(customers::created_at.desc())
                .limit(window.limit)
                .offset(window.offset)
                .load(conn)?;
            Ok(Page {
                rows: rows.into_iter().map(Customer::from).collect(),
                total,
            })
        })
    }

    fn orders_page(
        &self,
        term: Option<&str>,
        filter: &OrderFilter,
        window: PageWindow,
    ) -> Result<Page<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders_query(filter, term).count().get_result(conn)?;
            let rows = orders_query(filter, term)
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(window.limit)
                .offset(window.offset)
                .load(conn)?;
            Ok(Page {
                rows: rows
                    .into_iter()
                    .map(Order::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
                total,
            })
        })
    }
}

impl ResourceStore<Products> for DieselStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list_page(&self, filter: &ProductFilter, window: PageWindow) -> Result<Page<Product>, DomainError> {
        self.products_page(None, filter, window)
    }

    fn search_page(&self, term: &str, filter: &ProductFilter, window: PageWindow) -> Result<Page<Product>, DomainError> {
        self.products_page(Some(term), filter, window)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::delete(products::table.find(id)).execute(&mut conn)? > 0)
    }
}

impl ResourceStore<Variants> for DieselStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductVariant>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = product_variants::table
            .find(id)
            .select(VariantRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(ProductVariant::from))
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
        let mut conn = self.pool.get()?;
        Ok(diesel::delete(product_variants::table.find(id)).execute(&mut conn)? > 0)
    }
}

impl ResourceStore<Categories> for DieselStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = categories::table
            .find(id)
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Category::from))
    }

    fn list_page(&self, _filter: &(), window: PageWindow) -> Result<Page<Category>, DomainError> {
        self.categories_page(None, window)
    }

    fn search_page(&self, term: &str, _filter: &(), window: PageWindow) -> Result<Page<Category>, DomainError> {
        self.categories_page(Some(term), window)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::delete(categories::table.find(id)).execute(&mut conn)? > 0)
    }
}

impl ResourceStore<Subcategories> for DieselStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Subcategory>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = subcategories::table
            .find(id)
            .select(SubcategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Subcategory::from))
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
        let mut conn = self.pool.get()?;
        Ok(diesel::delete(subcategories::table.find(id)).execute(&mut conn)? > 0)
    }
}

impl ResourceStore<Customers> for DieselStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = customers::table
            .find(id)
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn list_page(&self, _filter: &(), window: PageWindow) -> Result<Page<Customer>, DomainError> {
        self.customers_page(None, window)
    }

    fn search_page(&self, term: &str, _filter: &(), window: PageWindow) -> Result<Page<Customer>, DomainError> {
        self.customers_page(Some(term), window)
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::delete(customers::table.find(id)).execute(&mut conn)? > 0)
    }
}

impl ResourceStore<Orders> for DieselStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
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

impl CustomerStore for DieselStore {
    fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = customers::table
            .filter(customers::email.eq(email))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }

    fn insert_if_absent(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(customers::table)
            .values(&NewCustomerRow {
                id: Uuid::new_v4(),
                email: customer.email.clone(),
                name: customer.name,
                address: customer.address,
                phone: customer.phone,
            })
            .on_conflict(customers::email)
            .do_nothing()
            .execute(&mut conn)?;

        // Whoever won the race owns the email now.
        let row = customers::table
            .filter(customers::email.eq(&customer.email))
            .select(CustomerRow::as_select())
            .first(&mut conn)?;
        Ok(row.into())
    }

    fn update_customer(&self, id: Uuid, patch: CustomerPatch) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(customers::table.find(id))
            .set(&CustomerChangeset {
                name: patch.name,
                address: patch.address,
                phone: patch.phone,
                updated_at: Utc::now(),
            })
            .returning(CustomerRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Customer::from))
    }
}

impl OrderStore for DieselStore {
    fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        orders::table
            .filter(orders::idempotency_key.eq(key))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
    }

    fn insert_order(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id: Uuid::new_v4(),
                customer_id: order.customer_id,
                total: order.total,
                currency: order.currency.code().to_string(),
                status: OrderStatus::Pending.as_str().to_string(),
                payment_method: order.payment_method,
                shipping_address: order.shipping_address,
                idempotency_key: order.idempotency_key,
            })
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)?;
        Order::try_from(row)
    }

    fn insert_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let new_rows: Vec<NewOrderItemRow> = items
            .into_iter()
            .map(|i| NewOrderItemRow {
                id: Uuid::new_v4(),
                order_id: i.order_id,
                product_id: i.product_id,
                variant_id: i.variant_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect();

        conn.transaction::<_, DomainError, _>(|conn| {
            let rows: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
                .values(&new_rows)
                .returning(OrderItemRow::as_returning())
                .get_results(conn)?;
            Ok(rows.into_iter().map(OrderItem::from).collect())
        })
    }

    fn delete_order(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        // order_items rows go with it through ON DELETE CASCADE.
        Ok(diesel::delete(orders::table.find(id)).execute(&mut conn)? > 0)
    }

    fn items_for(&self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .select(OrderItemRow::as_select())
            .order(order_items::created_at.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        let target = orders::table
            .find(id)
            .filter(orders::status.eq(from.as_str()));
        diesel::update(target)
            .set((
                orders::status.eq(to.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
    }
}

impl CatalogStore for DieselStore {
    fn insert_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(categories::table)
            .values(&NewCategoryRow {
                id: Uuid::new_v4(),
                name: category.name,
                description: category.description,
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn insert_subcategory(&self, subcategory: NewSubcategory) -> Result<Subcategory, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(subcategories::table)
            .values(&NewSubcategoryRow {
                id: Uuid::new_v4(),
                category_id: subcategory.category_id,
                name: subcategory.name,
                description: subcategory.description,
            })
            .returning(SubcategoryRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn insert_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                name: product.name,
                description: product.description,
                category_id: product.category_id,
                subcategory_id: product.subcategory_id,
                base_price: product.pricing.base_price,
                price_ngn: product.pricing.price_ngn,
                price_ghs: product.pricing.price_ghs,
                stock: product.stock,
                is_active: product.is_active,
                sort_order: product.sort_order,
                images: product.images,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn insert_variant(&self, variant: NewVariant) -> Result<ProductVariant, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(product_variants::table)
            .values(&NewVariantRow {
                id: Uuid::new_v4(),
                product_id: variant.product_id,
                name: variant.name,
                description: variant.description,
                base_price: variant.pricing.base_price,
                price_ngn: variant.pricing.price_ngn,
                price_ghs: variant.pricing.price_ghs,
                stock: variant.stock,
                is_active: variant.is_active,
                sort_order: variant.sort_order,
                images: variant.images,
            })
            .returning(VariantRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }
}
