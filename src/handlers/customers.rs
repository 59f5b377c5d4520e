use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{delete_resource, get_resource, list_resource, run_blocking, DeletedResponse, ListResponse};
use crate::application::{AppState, Store};
use crate::domain::customer::{Customer, CustomerPatch};
use crate::domain::ports::Customers;
use crate::errors::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
            address: c.address,
            phone: c.phone,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Fields left out are not changed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomerListParams {
    /// Page number (1-based). Defaults to 1.
    pub page: Option<i64>,
    /// Items per page. Defaults to the configured page size.
    pub limit: Option<i64>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/customers",
    params(CustomerListParams),
    responses(
        (status = 200, description = "One page of customers, newest first", body = ListResponse<CustomerResponse>),
        (status = 400, description = "Invalid paging parameters"),
    ),
    tag = "customers"
)]
pub async fn list_customers<S: Store>(
    state: web::Data<AppState<S>>,
    query: web::Query<CustomerListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let result =
        list_resource::<S, Customers>(state, params.page, params.limit, (), params.search).await?;
    Ok(HttpResponse::Ok().json(ListResponse::from_result(result, CustomerResponse::from)))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let customer = get_resource::<S, Customers>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

#[utoipa::path(
    patch,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn update_customer<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let body = body.into_inner();
    let patch = CustomerPatch {
        name: body.name,
        address: body.address,
        phone: body.phone,
    };
    let updated =
        run_blocking(move || Ok(state.admin.update_customer(customer_id, patch)?)).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer deleted", body = DeletedResponse),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer still has orders"),
    ),
    tag = "customers"
)]
pub async fn delete_customer<S: Store>(
    state: web::Data<AppState<S>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = delete_resource::<S, Customers>(state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}
