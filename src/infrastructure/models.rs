use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::{Category, ItemPricing, Product, ProductVariant, Subcategory};
use crate::domain::currency::CurrencyCode;
use crate::domain::customer::Customer;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::schema::{
    categories, customers, order_items, orders, product_variants, products, subcategories,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category {
            id: r.id,
            name: r.name,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = subcategories)]
#[diesel(belongs_to(CategoryRow, foreign_key = category_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubcategoryRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = subcategories)]
pub struct NewSubcategoryRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(r: SubcategoryRow) -> Self {
        Subcategory {
            id: r.id,
            category_id: r.category_id,
            name: r.name,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub base_price: Option<BigDecimal>,
    pub price_ngn: Option<BigDecimal>,
    pub price_ghs: Option<BigDecimal>,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub base_price: Option<BigDecimal>,
    pub price_ngn: Option<BigDecimal>,
    pub price_ghs: Option<BigDecimal>,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            description: r.description,
            category_id: r.category_id,
            subcategory_id: r.subcategory_id,
            pricing: ItemPricing {
                base_price: r.base_price,
                price_ngn: r.price_ngn,
                price_ghs: r.price_ghs,
            },
            stock: r.stock,
            is_active: r.is_active,
            sort_order: r.sort_order,
            images: r.images,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = product_variants)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Option<BigDecimal>,
    pub price_ngn: Option<BigDecimal>,
    pub price_ghs: Option<BigDecimal>,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_variants)]
pub struct NewVariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Option<BigDecimal>,
    pub price_ngn: Option<BigDecimal>,
    pub price_ghs: Option<BigDecimal>,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
}

impl From<VariantRow> for ProductVariant {
    fn from(r: VariantRow) -> Self {
        ProductVariant {
            id: r.id,
            product_id: r.product_id,
            name: r.name,
            description: r.description,
            pricing: ItemPricing {
                base_price: r.base_price,
                price_ngn: r.price_ngn,
                price_ghs: r.price_ghs,
            },
            stock: r.stock,
            is_active: r.is_active,
            sort_order: r.sort_order,
            images: r.images,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// `None` fields are left untouched by the update.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = customers)]
pub struct CustomerChangeset {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Customer {
            id: r.id,
            email: r.email,
            name: r.name,
            address: r.address,
            phone: r.phone,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = orders)]
#[diesel(belongs_to(CustomerRow, foreign_key = customer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total: BigDecimal,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub shipping_address: String,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total: BigDecimal,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub shipping_address: String,
    pub idempotency_key: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: r.id,
            customer_id: r.customer_id,
            total: r.total,
            currency: CurrencyCode::from_str(&r.currency)?,
            status: OrderStatus::from_str(&r.status)?,
            payment_method: r.payment_method,
            shipping_address: r.shipping_address,
            idempotency_key: r.idempotency_key,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        OrderItem {
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            quantity: r.quantity,
            unit_price: r.unit_price,
            created_at: r.created_at,
        }
    }
}
