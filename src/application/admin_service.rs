use std::sync::Arc;

use uuid::Uuid;

use crate::domain::catalog::{
    require_name, Category, NewCategory, NewProduct, NewSubcategory, NewVariant, Product,
    ProductVariant, Subcategory,
};
use crate::domain::customer::{Customer, CustomerPatch};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderDetail, OrderStatus};
use crate::domain::ports::{
    CatalogStore, Categories, CustomerStore, OrderStore, Orders, Products, Resource, ResourceStore,
    Subcategories,
};

/// Admin edits: catalog creation, deletes, order status and customer details.
pub struct AdminService<S> {
    store: Arc<S>,
}

impl<S> AdminService<S>
where
    S: CatalogStore
        + CustomerStore
        + OrderStore
        + ResourceStore<Categories>
        + ResourceStore<Subcategories>
        + ResourceStore<Products>
        + ResourceStore<Orders>,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        require_name(&category.name)?;
        let created = self.store.insert_category(category)?;
        log::info!("Created category {} ({})", created.id, created.name);
        Ok(created)
    }

    pub fn create_subcategory(&self, subcategory: NewSubcategory) -> Result<Subcategory, DomainError> {
        require_name(&subcategory.name)?;
        self.require::<Categories>(subcategory.category_id, "parent category")?;
        let created = self.store.insert_subcategory(subcategory)?;
        log::info!(
            "Created subcategory {} under category {}",
            created.id,
            created.category_id
        );
        Ok(created)
    }

    pub fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        product.validate()?;
        if let Some(category_id) = product.category_id {
            self.require::<Categories>(category_id, "category")?;
        }
        if let Some(subcategory_id) = product.subcategory_id {
            let subcategory: Subcategory =
                self.require::<Subcategories>(subcategory_id, "subcategory")?;
            if product
                .category_id
                .is_some_and(|category_id| category_id != subcategory.category_id)
            {
                return Err(DomainError::Validation(format!(
                    "subcategory {subcategory_id} does not belong to the product's category"
                )));
            }
        }
        let created = self.store.insert_product(product)?;
        log::info!("Created product {} ({})", created.id, created.name);
        Ok(created)
    }

    pub fn create_variant(&self, variant: NewVariant) -> Result<ProductVariant, DomainError> {
        variant.validate()?;
        self.require::<Products>(variant.product_id, "product")?;
        let created = self.store.insert_variant(variant)?;
        log::info!(
            "Created variant {} of product {}",
            created.id,
            created.product_id
        );
        Ok(created)
    }

    pub fn delete<R>(&self, id: Uuid) -> Result<bool, DomainError>
    where
        R: Resource,
        S: ResourceStore<R>,
    {
        let deleted = ResourceStore::<R>::delete(&*self.store, id)?;
        if deleted {
            log::info!("Deleted {} {}", R::NAME, id);
        }
        Ok(deleted)
    }

    pub fn order_detail(&self, order_id: Uuid) -> Result<OrderDetail, DomainError> {
        let order = self.find::<Orders>(order_id)?.ok_or(DomainError::NotFound)?;
        let items = self.store.items_for(order.id)?;
        Ok(OrderDetail { order, items })
    }

    pub fn update_order_status(&self, order_id: Uuid, next: OrderStatus) -> Result<Order, DomainError> {
        let order = self.find::<Orders>(order_id)?.ok_or(DomainError::NotFound)?;
        if order.status == next {
            return Ok(order);
        }
        if !order.status.can_transition_to(next) {
            return Err(DomainError::Conflict(format!(
                "order {} cannot move from {} to {}",
                order.id, order.status, next
            )));
        }
        let Some(updated) = self.store.update_status(order_id, order.status, next)? else {
            // Changed or removed since it was read.
            return match self.find::<Orders>(order_id)? {
                Some(current) => Err(DomainError::Conflict(format!(
                    "order {} is now {}, not {}",
                    order_id, current.status, order.status
                ))),
                None => Err(DomainError::NotFound),
            };
        };
        log::info!("Order {} moved from {} to {}", order_id, order.status, next);
        Ok(updated)
    }

    pub fn update_customer(&self, customer_id: Uuid, patch: CustomerPatch) -> Result<Customer, DomainError> {
        patch.validate()?;
        self.store
            .update_customer(customer_id, patch)?
            .ok_or(DomainError::NotFound)
    }

    fn find<R>(&self, id: Uuid) -> Result<Option<R::Record>, DomainError>
    where
        R: Resource,
        S: ResourceStore<R>,
    {
        ResourceStore::<R>::find_by_id(&*self.store, id)
    }

    /// Loads a referenced row, reporting a dangling reference as invalid input.
    fn require<R>(&self, id: Uuid, what: &str) -> Result<R::Record, DomainError>
    where
        R: Resource,
        S: ResourceStore<R>,
    {
        self.find::<R>(id)?
            .ok_or_else(|| DomainError::Validation(format!("{what} {id} does not exist")))
    }
}
