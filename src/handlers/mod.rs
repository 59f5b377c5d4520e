pub mod catalog;
pub mod customers;
pub mod orders;

use std::str::FromStr;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::application::{AppState, Store};
use crate::domain::pagination::{PageMeta, PaginatedResult};
use crate::domain::ports::{Resource, ResourceStore};
use crate::errors::AppError;

// ── Shared DTOs ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetaResponse {
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub previous_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl From<PageMeta> for PageMetaResponse {
    fn from(m: PageMeta) -> Self {
        Self {
            page: m.page,
            limit: m.limit,
            total_pages: m.total_pages,
            previous_page: m.previous_page,
            next_page: m.next_page,
        }
    }
}

/// One page of a resource listing. `total` counts every match, not just
/// the rows on this page.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse<T> {
    pub documents: Vec<T>,
    pub total: i64,
    pub meta: PageMetaResponse,
}

impl<T> ListResponse<T> {
    pub fn from_result<U>(result: PaginatedResult<U>, to_dto: impl FnMut(U) -> T) -> Self {
        let result = result.map(to_dto);
        Self {
            documents: result.documents,
            total: result.total,
            meta: result.meta.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub id: Uuid,
    pub deleted: bool,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Runs blocking store work off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

pub(crate) async fn list_resource<S, R>(
    state: web::Data<AppState<S>>,
    page: Option<i64>,
    limit: Option<i64>,
    filter: R::Filter,
    search: Option<String>,
) -> Result<PaginatedResult<R::Record>, AppError>
where
    S: ResourceStore<R>,
    R: Resource,
{
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(state.limits.default_limit);
    run_blocking(move || {
        Ok(state
            .queries
            .list::<R>(page, limit, &filter, search.as_deref())?)
    })
    .await
}

pub(crate) async fn get_resource<S, R>(
    state: web::Data<AppState<S>>,
    id: Uuid,
) -> Result<R::Record, AppError>
where
    S: ResourceStore<R>,
    R: Resource,
{
    run_blocking(move || Ok(state.queries.get_by_id::<R>(id)?)).await
}

pub(crate) async fn delete_resource<S, R>(
    state: web::Data<AppState<S>>,
    id: Uuid,
) -> Result<DeletedResponse, AppError>
where
    S: Store + ResourceStore<R>,
    R: Resource,
{
    let deleted = run_blocking(move || Ok(state.admin.delete::<R>(id)?)).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(DeletedResponse { id, deleted })
}

/// Decimal amounts travel as strings, e.g. "9.99".
pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::Validation(format!("Invalid {} '{}': {}", field, raw, e)))
}

pub(crate) fn parse_optional_amount(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<BigDecimal>, AppError> {
    raw.map(|r| parse_amount(field, r)).transpose()
}

// ── Extractor errors ─────────────────────────────────────────────────────────

pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

pub fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

// ── Routing ──────────────────────────────────────────────────────────────────

pub fn routes<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .route("", web::get().to(catalog::list_products::<S>))
            .route("", web::post().to(catalog::create_product::<S>))
            .route("/{id}", web::get().to(catalog::get_product::<S>))
            .route("/{id}", web::delete().to(catalog::delete_product::<S>))
            .route("/{id}/price", web::get().to(catalog::product_price::<S>)),
    )
    .service(
        web::scope("/variants")
            .route("", web::get().to(catalog::list_variants::<S>))
            .route("", web::post().to(catalog::create_variant::<S>))
            .route("/{id}", web::get().to(catalog::get_variant::<S>))
            .route("/{id}", web::delete().to(catalog::delete_variant::<S>)),
    )
    .service(
        web::scope("/categories")
            .route("", web::get().to(catalog::list_categories::<S>))
            .route("", web::post().to(catalog::create_category::<S>))
            .route("/{id}", web::get().to(catalog::get_category::<S>))
            .route("/{id}", web::delete().to(catalog::delete_category::<S>)),
    )
    .service(
        web::scope("/subcategories")
            .route("", web::get().to(catalog::list_subcategories::<S>))
            .route("", web::post().to(catalog::create_subcategory::<S>))
            .route("/{id}", web::get().to(catalog::get_subcategory::<S>))
            .route("/{id}", web::delete().to(catalog::delete_subcategory::<S>)),
    )
    .service(
        web::scope("/customers")
            .route("", web::get().to(customers::list_customers::<S>))
            .route("/{id}", web::get().to(customers::get_customer::<S>))
            .route("/{id}", web::patch().to(customers::update_customer::<S>))
            .route("/{id}", web::delete().to(customers::delete_customer::<S>)),
    )
    .service(
        web::scope("/orders")
            .route("", web::get().to(orders::list_orders::<S>))
            .route("", web::post().to(orders::place_order::<S>))
            .route("/{id}", web::get().to(orders::get_order::<S>))
            .route("/{id}", web::delete().to(orders::delete_order::<S>))
            .route("/{id}/status", web::patch().to(orders::update_order_status::<S>)),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        catalog::list_products,
        catalog::get_product,
        catalog::create_product,
        catalog::delete_product,
        catalog::product_price,
        catalog::list_variants,
        catalog::get_variant,
        catalog::create_variant,
        catalog::delete_variant,
        catalog::list_categories,
        catalog::get_category,
        catalog::create_category,
        catalog::delete_category,
        catalog::list_subcategories,
        catalog::get_subcategory,
        catalog::create_subcategory,
        catalog::delete_subcategory,
        customers::list_customers,
        customers::get_customer,
        customers::update_customer,
        customers::delete_customer,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order,
    ),
    tags(
        (name = "catalog", description = "Products, variants and their categories"),
        (name = "customers", description = "Customer records"),
        (name = "orders", description = "Checkout and order administration"),
    )
)]
pub struct ApiDoc;
