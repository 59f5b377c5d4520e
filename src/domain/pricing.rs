use bigdecimal::BigDecimal;

use super::catalog::CatalogItem;
use super::currency::{CurrencyCode, CurrencyConverter, Money};

/// Where a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Explicit regional price, returned verbatim.
    Regional,
    /// Base price converted into the requested currency.
    Converted,
    /// The item carries no usable price. Resolves to zero and must be
    /// treated as a data-quality problem, not as a free item.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub money: Money,
    pub source: PriceSource,
}

impl ResolvedPrice {
    pub fn is_missing(&self) -> bool {
        self.source == PriceSource::Missing
    }
}

#[derive(Debug, Clone, Default)]
pub struct PriceResolver {
    converter: CurrencyConverter,
}

impl PriceResolver {
    pub fn new(converter: CurrencyConverter) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Regional price, then converted base price, then zero.
    pub fn resolve<I: CatalogItem + ?Sized>(&self, item: &I, currency: CurrencyCode) -> ResolvedPrice {
        let pricing = item.pricing();
        if let Some(price) = pricing.regional(currency) {
            return ResolvedPrice {
                money: Money::new(price.clone(), currency),
                source: PriceSource::Regional,
            };
        }
        if let Some(base) = &pricing.base_price {
            let amount: BigDecimal = self.converter.convert(base, CurrencyCode::BASE, currency);
            return ResolvedPrice {
                money: Money::new(amount, currency),
                source: PriceSource::Converted,
            };
        }
        log::warn!(
            "Item {} ({}) has no price for {} and no base price",
            item.id(),
            item.name(),
            currency
        );
        ResolvedPrice {
            money: Money::zero(currency),
            source: PriceSource::Missing,
        }
    }

    pub fn format_price<I: CatalogItem + ?Sized>(&self, item: &I, currency: CurrencyCode) -> String {
        self.resolve(item, currency).money.format()
    }
}
