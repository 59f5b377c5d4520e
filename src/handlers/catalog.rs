use std::str::FromStr;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    delete_resource, get_resource, list_resource, parse_optional_amount, run_blocking,
    DeletedResponse, ListResponse,
};
use crate::application::{AppState, Store};
use crate::domain::catalog::{
    Category, ItemPricing, NewCategory, NewProduct, NewSubcategory, NewVariant, Product,
    ProductVariant, Subcategory,
};
use crate::domain::currency::CurrencyCode;
use crate::domain::ports::{
    Categories, ProductFilter, Products, SubcategoryFilter, Subcategories, VariantFilter, Variants,
};
use crate::domain::pricing::PriceSource;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    /// Base-currency (USD) price as a decimal string.
    pub base_price: Option<String>,
    pub price_ngn: Option<String>,
    pub price_ghs: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn price_strings(p: &ItemPricing) -> [Option<String>; 3] {
    [&p.base_price, &p.price_ngn, &p.price_ghs].map(|v| v.as_ref().map(ToString::to_string))
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        let [base_price, price_ngn, price_ghs] = price_strings(&p.pricing);
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            category_id: p.category_id,
            subcategory_id: p.subcategory_id,
            base_price,
            price_ngn,
            price_ghs,
            stock: p.stock,
            is_active: p.is_active,
            sort_order: p.sort_order,
            images: p.images,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Option<String>,
    pub price_ngn: Option<String>,
    pub price_ghs: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProductVariant> for VariantResponse {
    fn from(v: ProductVariant) -> Self {
        let [base_price, price_ngn, price_ghs] = price_strings(&v.pricing);
        Self {
            id: v.id,
            product_id: v.product_id,
            name: v.name,
            description: v.description,
            base_price,
            price_ngn,
            price_ghs,
            stock: v.stock,
            is_active: v.is_active,
            sort_order: v.sort_order,
            images: v.images,
            created_at: v.created_at.to_rfc3339(),
            updated_at: v.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubcategoryResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Subcategory> for SubcategoryResponse {
    fn from(s: Subcategory) -> Self {
        Self {
            id: s.id,
            category_id: s.category_id,
            name: s.name,
            description: s.description,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    /// Decimal prices as strings to avoid floating-point issues, e.g. "9.99"
    pub base_price: Option<String>,
    pub price_ngn: Option<String>,
    pub price_ghs: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Option<String>,
    pub price_ngn: Option<String>,
    pub price_ghs: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubcategoryRequest {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

fn parse_pricing(
    base_price: Option<&str>,
    price_ngn: Option<&str>,
    price_ghs: Option<&str>,
) -> Result<ItemPricing, AppError> {
    Ok(ItemPricing {
        base_price: parse_optional_amount("base_price", base_price)?,
        price_ngn: parse_optional_amount("price_ngn", price_ngn)?,
        price_ghs: parse_optional_amount("price_ghs", price_ghs)?,
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceResponse {
    pub item_id: Uuid,
    pub name: String,
    pub currency: String,
    pub amount: String,
    /// Display string with symbol and grouping, e.g. "₦15,000".
    pub formatted: String,
    /// `regional`, `converted` or `missing`.
    pub source: String,
    pub stock: i32,
}

fn source_name(source: PriceSource) -> &'static str {
    match source {
        PriceSource::Regional => "regional",
        PriceSource::Converted => "converted",
        PriceSource::Missing => "missing",
    }
}

// ── Query parameters ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListParams {
    /// Page number (1-based). Defaults to 1.
    pub page: Option<i64>,
    /// Items per page. Defaults to the configured page size.
    pub limit: Option<i64>,
    /// Case-insensitive match on the product name.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    /// Only list active products.
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VariantListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubcategoryListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Parent category.
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PriceParams {
    /// USD, NGN or GHS. Defaults to USD.
    pub currency: Option<String>,
    /// Quote this variant instead of the product itself.
    pub variant_id: Option<Uuid>,
}

// ── Products ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/products",
    params(ProductListParams),
    responses(
        (status = 200, description = "One page of products", body = ListResponse<ProductResponse>),
        (status = 400, description = "Invalid paging parameters"),
    ),
    tag = "catalog"
)]
pub async fn list_products<S: Store>(
    state: web::Data<AppState<S>>,
    query: web::Query<ProductListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let filter = ProductFilter {
        category_id: params.category_id,
        subcategory_id: params.subcategory_id,
        active_only: params.active_only,
    };
    let result =
        list_resource::<S, Products>(state, params.page, params.limit, filter, params.search).await?;
    Ok(HttpResponse::Ok().json(ListResponse::from_result(result, ProductResponse::from)))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product = get_resource::<S, Products>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
    ),
    tag = "catalog"
)]
pub async fn create_product<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_product = NewProduct {
        pricing: parse_pricing(
            body.base_price.as_deref(),
            body.price_ngn.as_deref(),
            body.price_ghs.as_deref(),
        )?,
        name: body.name,
        description: body.description,
        category_id: body.category_id,
        subcategory_id: body.subcategory_id,
        stock: body.stock,
        is_active: body.is_active,
        sort_order: body.sort_order,
        images: body.images,
    };
    let created = run_blocking(move || Ok(state.admin.create_product(new_product)?)).await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product and its variants deleted", body = DeletedResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_product<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = delete_resource::<S, Products>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

/// GET /products/{id}/price
///
/// Quotes the product, or the given variant of it, in the requested currency.
#[utoipa::path(
    get,
    path = "/products/{id}/price",
    params(("id" = Uuid, Path, description = "Product UUID"), PriceParams),
    responses(
        (status = 200, description = "Resolved price", body = PriceResponse),
        (status = 400, description = "Unknown currency or foreign variant"),
        (status = 404, description = "Product or variant not found"),
    ),
    tag = "catalog"
)]
pub async fn product_price<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    query: web::Query<PriceParams>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let params = query.into_inner();
    let currency = match params.currency.as_deref() {
        Some(code) => CurrencyCode::from_str(code)?,
        None => CurrencyCode::BASE,
    };

    let quote = run_blocking(move || {
        Ok(state.prices.quote(product_id, params.variant_id, currency)?)
    })
    .await?;

    Ok(HttpResponse::Ok().json(PriceResponse {
        item_id: quote.item_id,
        name: quote.name,
        currency: quote.price.currency.to_string(),
        amount: quote.price.amount.to_string(),
        formatted: quote.formatted,
        source: source_name(quote.source).to_string(),
        stock: quote.stock,
    }))
}

// ── Variants ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/variants",
    params(VariantListParams),
    responses(
        (status = 200, description = "One page of variants", body = ListResponse<VariantResponse>),
        (status = 400, description = "Invalid paging parameters"),
    ),
    tag = "catalog"
)]
pub async fn list_variants<S: Store>(
    state: web::Data<AppState<S>>,
    query: web::Query<VariantListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let filter = VariantFilter {
        product_id: params.product_id,
    };
    let result =
        list_resource::<S, Variants>(state, params.page, params.limit, filter, params.search).await?;
    Ok(HttpResponse::Ok().json(ListResponse::from_result(result, VariantResponse::from)))
}

#[utoipa::path(
    get,
    path = "/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant UUID")),
    responses(
        (status = 200, description = "Variant found", body = VariantResponse),
        (status = 404, description = "Variant not found"),
    ),
    tag = "catalog"
)]
pub async fn get_variant<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let variant = get_resource::<S, Variants>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(VariantResponse::from(variant)))
}

#[utoipa::path(
    post,
    path = "/variants",
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant created", body = VariantResponse),
        (status = 400, description = "Invalid variant or unknown product"),
    ),
    tag = "catalog"
)]
pub async fn create_variant<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<CreateVariantRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_variant = NewVariant {
        pricing: parse_pricing(
            body.base_price.as_deref(),
            body.price_ngn.as_deref(),
            body.price_ghs.as_deref(),
        )?,
        product_id: body.product_id,
        name: body.name,
        description: body.description,
        stock: body.stock,
        is_active: body.is_active,
        sort_order: body.sort_order,
        images: body.images,
    };
    let created = run_blocking(move || Ok(state.admin.create_variant(new_variant)?)).await?;
    Ok(HttpResponse::Created().json(VariantResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/variants/{id}",
    params(("id" = Uuid, Path, description = "Variant UUID")),
    responses(
        (status = 200, description = "Variant deleted", body = DeletedResponse),
        (status = 404, description = "Variant not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_variant<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = delete_resource::<S, Variants>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

// ── Categories ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/categories",
    params(CategoryListParams),
    responses(
        (status = 200, description = "One page of categories", body = ListResponse<CategoryResponse>),
        (status = 400, description = "Invalid paging parameters"),
    ),
    tag = "catalog"
)]
pub async fn list_categories<S: Store>(
    state: web::Data<AppState<S>>,
    query: web::Query<CategoryListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let result =
        list_resource::<S, Categories>(state, params.page, params.limit, (), params.search).await?;
    Ok(HttpResponse::Ok().json(ListResponse::from_result(result, CategoryResponse::from)))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn get_category<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let category = get_resource::<S, Categories>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid category"),
    ),
    tag = "catalog"
)]
pub async fn create_category<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_category = NewCategory {
        name: body.name,
        description: body.description,
    };
    let created = run_blocking(move || Ok(state.admin.create_category(new_category)?)).await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 200, description = "Category and its subcategories deleted", body = DeletedResponse),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_category<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = delete_resource::<S, Categories>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

// ── Subcategories ────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/subcategories",
    params(SubcategoryListParams),
    responses(
        (status = 200, description = "One page of subcategories", body = ListResponse<SubcategoryResponse>),
        (status = 400, description = "Invalid paging parameters"),
    ),
    tag = "catalog"
)]
pub async fn list_subcategories<S: Store>(
    state: web::Data<AppState<S>>,
    query: web::Query<SubcategoryListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let filter = SubcategoryFilter {
        category_id: params.category_id,
    };
    let result =
        list_resource::<S, Subcategories>(state, params.page, params.limit, filter, params.search)
            .await?;
    Ok(HttpResponse::Ok().json(ListResponse::from_result(result, SubcategoryResponse::from)))
}

#[utoipa::path(
    get,
    path = "/subcategories/{id}",
    params(("id" = Uuid, Path, description = "Subcategory UUID")),
    responses(
        (status = 200, description = "Subcategory found", body = SubcategoryResponse),
        (status = 404, description = "Subcategory not found"),
    ),
    tag = "catalog"
)]
pub async fn get_subcategory<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let subcategory = get_resource::<S, Subcategories>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SubcategoryResponse::from(subcategory)))
}

#[utoipa::path(
    post,
    path = "/subcategories",
    request_body = CreateSubcategoryRequest,
    responses(
        (status = 201, description = "Subcategory created", body = SubcategoryResponse),
        (status = 400, description = "Invalid subcategory or unknown parent"),
    ),
    tag = "catalog"
)]
pub async fn create_subcategory<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<CreateSubcategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_subcategory = NewSubcategory {
        category_id: body.category_id,
        name: body.name,
        description: body.description,
    };
    let created =
        run_blocking(move || Ok(state.admin.create_subcategory(new_subcategory)?)).await?;
    Ok(HttpResponse::Created().json(SubcategoryResponse::from(created)))
}

#[utoipa::path(
    delete,
    path = "/subcategories/{id}",
    params(("id" = Uuid, Path, description = "Subcategory UUID")),
    responses(
        (status = 200, description = "Subcategory deleted", body = DeletedResponse),
        (status = 404, description = "Subcategory not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_subcategory<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = delete_resource::<S, Subcategories>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}
