use axum::{extract::State, http::StatusCode, Json};
use common::{ApiResponse, ListQuery, Paginated};
use model::entities::address;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{respond, DELETE_SUCCEEDED, GET_SUCCEEDED, POST_SUCCEEDED, PUT_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::{AppPath, AppQuery, ValidJson};
use crate::middleware::AuthUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::addresses::{self, AddressChanges, NewAddress, SORTABLE_COLUMNS};
use crate::services::users;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressResponse {
    pub id: i32,
    pub judul_alamat: String,
    pub nama_penerima: String,
    pub no_telp: String,
    pub detail_alamat: String,
}

impl From<address::Model> for AddressResponse {
    fn from(model: address::Model) -> Self {
        Self {
            id: model.id,
            judul_alamat: model.judul_alamat,
            nama_penerima: model.nama_penerima,
            no_telp: model.no_telp,
            detail_alamat: model.detail_alamat,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1))]
    pub judul_alamat: String,
    #[validate(length(min = 1))]
    pub nama_penerima: String,
    /// Defaults to the caller's phone number
    pub no_telp: Option<String>,
    #[validate(length(min = 1))]
    pub detail_alamat: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1))]
    pub judul_alamat: Option<String>,
    #[validate(length(min = 1))]
    pub nama_penerima: Option<String>,
    #[validate(length(min = 1))]
    pub no_telp: Option<String>,
    #[validate(length(min = 1))]
    pub detail_alamat: Option<String>,
}

/// Add a shipping address for the caller
#[utoipa::path(
    post,
    path = "/api/v1/user/alamat",
    request_body = CreateAddressRequest,
    responses(
        (status = 201, description = "Address created", body = ApiResponse<AddressResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "addresses"
)]
#[instrument(skip(state))]
pub async fn create_address(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(request): ValidJson<CreateAddressRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AddressResponse>>)> {
    let owner = users::find(&state.db, caller.id).await?;
    let created = addresses::create(
        &state.db,
        &owner,
        NewAddress {
            no_telp: request.no_telp,
            judul_alamat: request.judul_alamat,
            nama_penerima: request.nama_penerima,
            detail_alamat: request.detail_alamat,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, respond(POST_SUCCEEDED, created.into())))
}

/// List the caller's addresses (every address for admins)
#[utoipa::path(
    get,
    path = "/api/v1/user/alamat",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of addresses", body = ApiResponse<Paginated<AddressResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "addresses"
)]
#[instrument(skip(state))]
pub async fn list_addresses(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<AddressResponse>>>> {
    let filter = query.resolve(SORTABLE_COLUMNS)?;
    let page = addresses::list(&state.db, caller.id, caller.is_admin, &filter).await?;
    debug!("Retrieved {} addresses", page.data.len());
    Ok(respond(GET_SUCCEEDED, page.map(AddressResponse::from)))
}

/// Get one of the caller's addresses
#[utoipa::path(
    get,
    path = "/api/v1/user/alamat/{id}",
    params(("id" = i32, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address", body = ApiResponse<AddressResponse>),
        (status = 404, description = "Address not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "addresses"
)]
#[instrument(skip(state))]
pub async fn get_address(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<AddressResponse>>> {
    let found = addresses::find_owned(&state.db, id, caller.id, caller.is_admin).await?;
    Ok(respond(GET_SUCCEEDED, found.into()))
}

/// Partially update one of the caller's addresses
#[utoipa::path(
    put,
    path = "/api/v1/user/alamat/{id}",
    params(("id" = i32, Path, description = "Address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<AddressResponse>),
        (status = 404, description = "Address not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "addresses"
)]
#[instrument(skip(state))]
pub async fn update_address(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<i32>,
    ValidJson(request): ValidJson<UpdateAddressRequest>,
) -> ApiResult<Json<ApiResponse<AddressResponse>>> {
    let changes = AddressChanges {
        no_telp: request.no_telp,
        judul_alamat: request.judul_alamat,
        nama_penerima: request.nama_penerima,
        detail_alamat: request.detail_alamat,
    };
    let updated = addresses::update(&state.db, id, caller.id, caller.is_admin, changes).await?;
    Ok(respond(PUT_SUCCEEDED, updated.into()))
}

/// Delete one of the caller's addresses
#[utoipa::path(
    delete,
    path = "/api/v1/user/alamat/{id}",
    params(("id" = i32, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted", body = ApiResponse<String>),
        (status = 404, description = "Address not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "addresses"
)]
#[instrument(skip(state))]
pub async fn delete_address(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    addresses::delete(&state.db, id, caller.id, caller.is_admin).await?;
    Ok(respond(DELETE_SUCCEEDED, String::new()))
}
