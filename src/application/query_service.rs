use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::pagination::{self, PaginatedResult};
use crate::domain::ports::{Resource, ResourceStore};

/// Paged, filtered and searchable listing over every catalog resource.
pub struct ResourceQueryService<S> {
    store: Arc<S>,
    max_limit: i64,
}

impl<S> ResourceQueryService<S> {
    pub fn new(store: Arc<S>, max_limit: i64) -> Self {
        Self { store, max_limit }
    }

    /// Lists one page of `R`.
    ///
    /// Invalid paging parameters are rejected. A failing store does not
    /// surface as an error: the failure is logged and an empty page returned.
    pub fn list<R>(
        &self,
        page: i64,
        limit: i64,
        filter: &R::Filter,
        search: Option<&str>,
    ) -> Result<PaginatedResult<R::Record>, DomainError>
    where
        R: Resource,
        S: ResourceStore<R>,
    {
        if limit > self.max_limit {
            return Err(DomainError::Validation(format!(
                "limit must be at most {}, got {limit}",
                self.max_limit
            )));
        }
        let window = pagination::window(page, limit)?;
        let term = search.map(str::trim).filter(|t| !t.is_empty());

        let fetched = match term {
            Some(term) => ResourceStore::<R>::search_page(&*self.store, term, filter, window),
            None => ResourceStore::<R>::list_page(&*self.store, filter, window),
        };

        match fetched {
            Ok(rows) => {
                let meta = pagination::compute_meta(page, limit, rows.total)?;
                Ok(PaginatedResult::from_page(rows, meta))
            }
            Err(e) => {
                log::error!(
                    "Failed to list {} (page: {page}, limit: {limit}, filter: {:?}, search: {:?}): {e}",
                    R::NAME,
                    filter,
                    term
                );
                Ok(PaginatedResult::empty(page, limit))
            }
        }
    }

    pub fn get_by_id<R>(&self, id: Uuid) -> Result<R::Record, DomainError>
    where
        R: Resource,
        S: ResourceStore<R>,
    {
        ResourceStore::<R>::find_by_id(&*self.store, id)?.ok_or(DomainError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::catalog::{ItemPricing, NewCategory, NewProduct};
    use crate::domain::order::OrderStatus;
    use crate::domain::pagination::{Page, PageWindow};
    use crate::domain::ports::{
        CatalogStore, Categories, OrderFilter, Orders, ProductFilter, Products,
    };
    use crate::infrastructure::memory_store::InMemoryStore;

    fn seed_products(store: &InMemoryStore, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            store
                .insert_product(NewProduct {
                    name: name.to_string(),
                    description: None,
                    category_id: None,
                    subcategory_id: None,
                    pricing: ItemPricing {
                        base_price: Some(BigDecimal::from(5)),
                        ..Default::default()
                    },
                    stock: 1,
                    is_active: true,
                    sort_order: i as i32,
                    images: vec![],
                })
                .unwrap();
        }
    }

    fn service(store: InMemoryStore) -> ResourceQueryService<InMemoryStore> {
        ResourceQueryService::new(Arc::new(store), 100)
    }

    #[test]
    fn lists_second_page_of_products() {
        let store = InMemoryStore::new();
        let names: Vec<String> = (0..25).map(|i| format!("Product {i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        seed_products(&store, &refs);

        let result = service(store)
            .list::<Products>(2, 10, &ProductFilter::default(), None)
            .unwrap();

        assert_eq!(result.total, 25);
        assert_eq!(result.documents.len(), 10);
        assert_eq!(result.meta.total_pages, 3);
        assert_eq!(result.meta.previous_page, Some(1));
        assert_eq!(result.meta.next_page, Some(3));
        assert_eq!(result.documents[0].name, "Product 10");
    }

    #[test]
    fn search_total_counts_every_match_not_just_the_page() {
        let store = InMemoryStore::new();
        let mut names: Vec<String> = (0..15).map(|i| format!("Linen dress {i}")).collect();
        names.extend((0..7).map(|i| format!("Wool hat {i}")));
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        seed_products(&store, &refs);
        let service = service(store);

        let first = service
            .list::<Products>(1, 10, &ProductFilter::default(), Some("linen"))
            .unwrap();
        assert_eq!(first.documents.len(), 10);
        assert_eq!(first.total, 15);
        assert_eq!(first.meta.total_pages, 2);
        assert_eq!(first.meta.next_page, Some(2));

        let second = service
            .list::<Products>(2, 10, &ProductFilter::default(), Some("linen"))
            .unwrap();
        assert_eq!(second.documents.len(), 5);
        assert_eq!(second.total, 15);
        assert_eq!(second.meta.next_page, None);
    }

    #[test]
    fn blank_search_lists_everything() {
        let store = InMemoryStore::new();
        seed_products(&store, &["Beads", "Sandals"]);
        let result = service(store)
            .list::<Products>(1, 10, &ProductFilter::default(), Some("   "))
            .unwrap();
        assert_eq!(result.total, 2);
    }

    #[test]
    fn rejects_bad_paging_parameters() {
        let service = service(InMemoryStore::new());
        for (page, limit) in [(0, 10), (1, 0), (-3, 5), (1, 101)] {
            let result = service.list::<Categories>(page, limit, &(), None);
            assert!(
                matches!(result, Err(DomainError::Validation(_))),
                "page {page} limit {limit} should be rejected"
            );
        }
    }

    #[test]
    fn orders_filter_by_status() {
        let store = InMemoryStore::new();
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
            customer_id: None,
        };
        let result = service(store).list::<Orders>(1, 10, &filter, None).unwrap();
        assert_eq!(result.total, 0);
        assert_eq!(result.meta.total_pages, 0);
    }

    #[test]
    fn get_by_id_distinguishes_not_found() {
        let store = InMemoryStore::new();
        let category = store
            .insert_category(NewCategory {
                name: "Jewellery".into(),
                description: None,
            })
            .unwrap();
        let service = service(store);

        assert_eq!(service.get_by_id::<Categories>(category.id).unwrap(), category);
        assert!(matches!(
            service.get_by_id::<Categories>(Uuid::new_v4()),
            Err(DomainError::NotFound)
        ));
    }

    struct BrokenStore;

    impl ResourceStore<Categories> for BrokenStore {
        fn find_by_id(&self, _id: Uuid) -> Result<Option<crate::domain::catalog::Category>, DomainError> {
            Err(DomainError::TransientStore("connection refused".into()))
        }
        fn list_page(
            &self,
            _filter: &(),
            _window: PageWindow,
        ) -> Result<Page<crate::domain::catalog::Category>, DomainError> {
            Err(DomainError::TransientStore("connection refused".into()))
        }
        fn search_page(
            &self,
            _term: &str,
            _filter: &(),
            _window: PageWindow,
        ) -> Result<Page<crate::domain::catalog::Category>, DomainError> {
            Err(DomainError::TransientStore("timed out".into()))
        }
        fn delete(&self, _id: Uuid) -> Result<bool, DomainError> {
            Err(DomainError::TransientStore("connection refused".into()))
        }
    }

    #[test]
    fn store_failure_degrades_to_empty_page() {
        let service = ResourceQueryService::new(Arc::new(BrokenStore), 100);

        let listed = service.list::<Categories>(2, 10, &(), None).unwrap();
        assert!(listed.documents.is_empty());
        assert_eq!(listed.total, 0);
        assert_eq!(listed.meta.total_pages, 0);
        assert_eq!(listed.meta.next_page, None);

        let searched = service.list::<Categories>(1, 10, &(), Some("rings")).unwrap();
        assert!(searched.documents.is_empty());
    }

    #[test]
    fn single_lookup_failure_propagates() {
        let service = ResourceQueryService::new(Arc::new(BrokenStore), 100);
        assert!(matches!(
            service.get_by_id::<Categories>(Uuid::new_v4()),
            Err(DomainError::TransientStore(_))
        ));
    }
}
