use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::currency::{check_amount, CurrencyCode};
use super::errors::{check_length, DomainError};

/// Prices of a sellable item. `base_price` is in the base currency; the
/// regional fields are explicit prices that take precedence over conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemPricing {
    pub base_price: Option<BigDecimal>,
    pub price_ngn: Option<BigDecimal>,
    pub price_ghs: Option<BigDecimal>,
}

impl ItemPricing {
    pub fn regional(&self, currency: CurrencyCode) -> Option<&BigDecimal> {
        match currency {
            CurrencyCode::NGN => self.price_ngn.as_ref(),
            CurrencyCode::GHS => self.price_ghs.as_ref(),
            CurrencyCode::USD => None,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let prices = [&self.base_price, &self.price_ngn, &self.price_ghs];
        if prices.iter().all(|p| p.is_none()) {
            return Err(DomainError::Validation(
                "a base price or at least one regional price is required".into(),
            ));
        }
        if prices.into_iter().flatten().any(|p| *p < BigDecimal::from(0)) {
            return Err(DomainError::Validation("prices must not be negative".into()));
        }
        let columns = [
            ("base_price", &self.base_price, 10),
            ("price_ngn", &self.price_ngn, 12),
            ("price_ghs", &self.price_ghs, 10),
        ];
        for (field, price, integer_digits) in columns {
            if let Some(price) = price {
                check_amount(field, price, integer_digits)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub pricing: ItemPricing,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub pricing: ItemPricing,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subcategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Anything that can be put in a cart: a product or one of its variants.
pub trait CatalogItem {
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn pricing(&self) -> &ItemPricing;
    fn stock(&self) -> i32;
    fn images(&self) -> &[String];
}

impl CatalogItem for Product {
    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn pricing(&self) -> &ItemPricing {
        &self.pricing
    }
    fn stock(&self) -> i32 {
        self.stock
    }
    fn images(&self) -> &[String] {
        &self.images
    }
}

impl CatalogItem for ProductVariant {
    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn pricing(&self) -> &ItemPricing {
        &self.pricing
    }
    fn stock(&self) -> i32 {
        self.stock
    }
    fn images(&self) -> &[String] {
        &self.images
    }
}

/// The item a shopper is looking at. A selected variant shadows its parent
/// product entirely: stock, price and images all come from the variant.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Product(&'a Product),
    Variant(&'a ProductVariant),
}

impl<'a> Selection<'a> {
    pub fn of(product: &'a Product, variant: Option<&'a ProductVariant>) -> Self {
        match variant {
            Some(v) => Selection::Variant(v),
            None => Selection::Product(product),
        }
    }

    fn item(&self) -> &dyn CatalogItem {
        match self {
            Selection::Product(p) => *p,
            Selection::Variant(v) => *v,
        }
    }
}

impl CatalogItem for Selection<'_> {
    fn id(&self) -> Uuid {
        self.item().id()
    }
    fn name(&self) -> &str {
        self.item().name()
    }
    fn pricing(&self) -> &ItemPricing {
        self.item().pricing()
    }
    fn stock(&self) -> i32 {
        self.item().stock()
    }
    fn images(&self) -> &[String] {
        self.item().images()
    }
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubcategory {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub pricing: ItemPricing,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewVariant {
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub pricing: ItemPricing,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
}

pub const MAX_NAME_LEN: usize = 255;

pub(crate) fn require_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("name must not be empty".into()));
    }
    check_length("name", name.trim(), MAX_NAME_LEN)
}

fn validate_sellable(name: &str, pricing: &ItemPricing, stock: i32) -> Result<(), DomainError> {
    require_name(name)?;
    pricing.validate()?;
    if stock < 0 {
        return Err(DomainError::Validation(format!(
            "stock must not be negative, got {stock}"
        )));
    }
    Ok(())
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_sellable(&self.name, &self.pricing, self.stock)
    }
}

impl NewVariant {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_sellable(&self.name, &self.pricing, self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Ankara shirt".into(),
            description: None,
            category_id: None,
            subcategory_id: None,
            pricing: ItemPricing {
                base_price: Some(BigDecimal::from(20)),
                ..Default::default()
            },
            stock: 4,
            is_active: true,
            sort_order: 0,
            images: vec!["shirt.jpg".into()],
            created_at: now,
            updated_at: now,
        }
    }

    fn variant(product_id: Uuid) -> ProductVariant {
        let now = Utc::now();
        ProductVariant {
            id: Uuid::new_v4(),
            product_id,
            name: "Ankara shirt / XL".into(),
            description: None,
            pricing: ItemPricing {
                price_ngn: Some(BigDecimal::from(5000)),
                ..Default::default()
            },
            stock: 0,
            is_active: true,
            sort_order: 1,
            images: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn variant_shadows_product() {
        let p = product();
        let v = variant(p.id);
        let selected = Selection::of(&p, Some(&v));
        assert_eq!(selected.id(), v.id);
        assert_eq!(selected.stock(), 0);
        assert!(selected.images().is_empty());
        assert_eq!(selected.pricing().base_price, None);
    }

    #[test]
    fn product_used_without_variant() {
        let p = product();
        let selected = Selection::of(&p, None);
        assert_eq!(selected.id(), p.id);
        assert_eq!(selected.stock(), 4);
        assert_eq!(selected.images(), ["shirt.jpg".to_string()].as_slice());
    }

    #[test]
    fn pricing_requires_some_price() {
        assert!(ItemPricing::default().validate().is_err());
        let regional_only = ItemPricing {
            price_ghs: Some(BigDecimal::from(12)),
            ..Default::default()
        };
        assert!(regional_only.validate().is_ok());
    }

    #[test]
    fn pricing_rejects_negative_prices() {
        let pricing = ItemPricing {
            base_price: Some(BigDecimal::from(-1)),
            ..Default::default()
        };
        assert!(matches!(pricing.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn new_product_rejects_negative_stock_and_blank_name() {
        let mut new = NewProduct {
            name: "Kente scarf".into(),
            description: None,
            category_id: None,
            subcategory_id: None,
            pricing: ItemPricing {
                base_price: Some(BigDecimal::from(8)),
                ..Default::default()
            },
            stock: -1,
            is_active: true,
            sort_order: 0,
            images: vec![],
        };
        assert!(new.validate().is_err());
        new.stock = 0;
        assert!(new.validate().is_ok());
        new.name = "  ".into();
        assert!(new.validate().is_err());
    }

    #[test]
    fn pricing_must_fit_the_price_columns() {
        let sub_cent = ItemPricing {
            price_ghs: Some("12.345".parse().unwrap()),
            ..Default::default()
        };
        assert!(matches!(sub_cent.validate(), Err(DomainError::Validation(_))));

        let naira = ItemPricing {
            price_ngn: Some("150000000000".parse().unwrap()),
            ..Default::default()
        };
        assert!(naira.validate().is_ok());
        let too_large = ItemPricing {
            base_price: Some("150000000000".parse().unwrap()),
            ..Default::default()
        };
        assert!(matches!(too_large.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn names_longer_than_the_column_are_rejected() {
        assert!(require_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(matches!(
            require_name(&"x".repeat(MAX_NAME_LEN + 1)),
            Err(DomainError::Validation(_))
        ));
    }
}
