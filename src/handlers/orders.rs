use std::str::FromStr;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    delete_resource, list_resource, parse_amount, run_blocking, DeletedResponse, ListResponse,
};
use crate::application::{AppState, Store};
use crate::domain::currency::CurrencyCode;
use crate::domain::customer::NewCustomer;
use crate::domain::order::{CheckoutRequest, Order, OrderItem, OrderItemInput, OrderStatus};
use crate::domain::ports::{OrderFilter, Orders};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutCustomerRequest {
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub customer: CheckoutCustomerRequest,
    pub items: Vec<CheckoutItemRequest>,
    /// Order total in `currency`, as a decimal string.
    pub total: String,
    /// USD, NGN or GHS.
    pub currency: String,
    pub payment_method: String,
    /// Repeating a checkout with the same key returns the original order.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            id: i.id,
            product_id: i.product_id,
            variant_id: i.variant_id,
            quantity: i.quantity,
            unit_price: i.unit_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub total: String,
    pub currency: String,
    /// Total with currency symbol, e.g. "GH₵1,250.00".
    pub total_display: String,
    pub status: String,
    pub payment_method: String,
    pub shipping_address: String,
    pub idempotency_key: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            total_display: o.total_money().format(),
            id: o.id,
            customer_id: o.customer_id,
            total: o.total.to_string(),
            currency: o.currency.to_string(),
            status: o.status.to_string(),
            payment_method: o.payment_method,
            shipping_address: o.shipping_address,
            idempotency_key: o.idempotency_key,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    /// True when an earlier order with the same idempotency key was returned.
    pub replayed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// pending, processing, shipped, delivered or cancelled.
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListParams {
    /// Page number (1-based). Defaults to 1.
    pub page: Option<i64>,
    /// Items per page. Defaults to the configured page size.
    pub limit: Option<i64>,
    /// Any fragment of the order id.
    pub search: Option<String>,
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
}

fn to_checkout(body: PlaceOrderRequest) -> Result<CheckoutRequest, AppError> {
    let items = body
        .items
        .into_iter()
        .map(|i| {
            Ok(OrderItemInput {
                unit_price: parse_amount("unit_price", &i.unit_price)?,
                product_id: i.product_id,
                variant_id: i.variant_id,
                quantity: i.quantity,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(CheckoutRequest {
        customer: NewCustomer {
            email: body.customer.email,
            name: body.customer.name,
            address: body.customer.address,
            phone: body.customer.phone,
        },
        items,
        total: parse_amount("total", &body.total)?,
        currency: CurrencyCode::from_str(&body.currency)?,
        payment_method: body.payment_method,
        idempotency_key: body.idempotency_key,
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order: resolves or creates the customer by email, then writes
/// the order and its items. If the items cannot be written the order is
/// removed again and the response reports whether that clean-up succeeded.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = PlaceOrderResponse),
        (status = 200, description = "Existing order returned for a repeated idempotency key", body = PlaceOrderResponse),
        (status = 400, description = "Invalid checkout"),
        (status = 409, description = "Total does not match the items"),
        (status = 500, description = "Order could not be completed"),
        (status = 503, description = "Storage unavailable"),
    ),
    tag = "orders"
)]
pub async fn place_order<S: Store>(
    state: web::Data<AppState<S>>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let checkout = to_checkout(body.into_inner())?;

    let placed = run_blocking(move || Ok(state.saga.place_order(checkout)?)).await?;

    let response = PlaceOrderResponse {
        replayed: placed.replayed,
        order: placed.order.into(),
        items: placed.items.into_iter().map(Into::into).collect(),
    };
    if response.replayed {
        Ok(HttpResponse::Ok().json(response))
    } else {
        Ok(HttpResponse::Created().json(response))
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    params(OrderListParams),
    responses(
        (status = 200, description = "One page of orders, newest first", body = ListResponse<OrderResponse>),
        (status = 400, description = "Invalid paging parameters or status"),
    ),
    tag = "orders"
)]
pub async fn list_orders<S: Store>(
    state: web::Data<AppState<S>>,
    query: web::Query<OrderListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let filter = OrderFilter {
        status: params
            .status
            .as_deref()
            .map(OrderStatus::from_str)
            .transpose()?,
        customer_id: params.customer_id,
    };
    let result =
        list_resource::<S, Orders>(state, params.page, params.limit, filter, params.search).await?;
    Ok(HttpResponse::Ok().json(ListResponse::from_result(result, OrderResponse::from)))
}

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderDetailResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let detail = run_blocking(move || Ok(state.admin.order_detail(order_id)?)).await?;
    Ok(HttpResponse::Ok().json(OrderDetailResponse {
        order: detail.order.into(),
        items: detail.items.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    tag = "orders"
)]
pub async fn update_order_status<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let next = OrderStatus::from_str(&body.status)?;
    let order = run_blocking(move || Ok(state.admin.update_order_status(order_id, next)?)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order and its items deleted", body = DeletedResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = delete_resource::<S, Orders>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}
