use std::sync::Arc;

use uuid::Uuid;

use crate::domain::catalog::{CatalogItem, Selection};
use crate::domain::currency::{CurrencyCode, Money};
use crate::domain::errors::DomainError;
use crate::domain::ports::{Products, ResourceStore, Variants};
use crate::domain::pricing::{PriceResolver, PriceSource};

/// Shopper-facing price of a product, or of one of its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub item_id: Uuid,
    pub name: String,
    pub price: Money,
    pub formatted: String,
    pub source: PriceSource,
    pub stock: i32,
}

pub struct PriceQuoteService<S> {
    store: Arc<S>,
    resolver: PriceResolver,
}

impl<S> PriceQuoteService<S>
where
    S: ResourceStore<Products> + ResourceStore<Variants>,
{
    pub fn new(store: Arc<S>, resolver: PriceResolver) -> Self {
        Self { store, resolver }
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    pub fn quote(
        &self,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        currency: CurrencyCode,
    ) -> Result<PriceQuote, DomainError> {
        let product =
            ResourceStore::<Products>::find_by_id(&*self.store, product_id)?.ok_or(DomainError::NotFound)?;
        let variant = match variant_id {
            Some(id) => {
                let variant =
                    ResourceStore::<Variants>::find_by_id(&*self.store, id)?.ok_or(DomainError::NotFound)?;
                if variant.product_id != product.id {
                    return Err(DomainError::Validation(format!(
                        "variant {id} does not belong to product {product_id}"
                    )));
                }
                Some(variant)
            }
            None => None,
        };

        let selected = Selection::of(&product, variant.as_ref());
        let resolved = self.resolver.resolve(&selected, currency);
        Ok(PriceQuote {
            item_id: selected.id(),
            name: selected.name().to_string(),
            formatted: resolved.money.format(),
            price: resolved.money,
            source: resolved.source,
            stock: selected.stock(),
        })
    }
}
