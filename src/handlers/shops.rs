use axum::{extract::State, http::StatusCode, Json};
use common::{ApiResponse, ListQuery, Paginated};
use model::entities::shop;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{respond, DELETE_SUCCEEDED, GET_SUCCEEDED, POST_SUCCEEDED, PUT_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::{AppPath, AppQuery, FormData, ValidJson};
use crate::middleware::AuthUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::shops::{self, SORTABLE_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShopResponse {
    pub id: i32,
    pub nama_toko: String,
    pub url_foto: Option<String>,
    /// Present only for admins and the shop's owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_user: Option<i32>,
}

impl ShopResponse {
    pub fn for_viewer(model: shop::Model, viewer: &AuthUser) -> Self {
        let show_owner = viewer.is_admin || viewer.id == model.id_user;
        Self {
            id: model.id,
            nama_toko: model.nama_toko,
            url_foto: model.url_foto,
            id_user: show_owner.then_some(model.id_user),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateShopRequest {
    #[validate(length(min = 1))]
    pub nama_toko: String,
}

/// Multipart body of a shop update.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdateShopForm {
    pub nama_toko: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub photo: Option<Vec<u8>>,
}

/// Get the caller's shop
#[utoipa::path(
    get,
    path = "/api/v1/toko/my",
    responses(
        (status = 200, description = "Caller's shop", body = ApiResponse<ShopResponse>),
        (status = 404, description = "Caller has no shop", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "shops"
)]
#[instrument(skip(state))]
pub async fn my_shop(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<ApiResponse<ShopResponse>>> {
    let found = shops::my_shop(&state.db, caller.id).await?;
    Ok(respond(GET_SUCCEEDED, ShopResponse::for_viewer(found, &caller)))
}

/// List shops
#[utoipa::path(
    get,
    path = "/api/v1/toko",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of shops", body = ApiResponse<Paginated<ShopResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "shops"
)]
#[instrument(skip(state))]
pub async fn list_shops(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<ShopResponse>>>> {
    let filter = query.resolve(SORTABLE_COLUMNS)?;
    let page = shops::list(&state.db, &filter).await?;
    debug!("Retrieved {} shops", page.data.len());
    Ok(respond(
        GET_SUCCEEDED,
        page.map(|s| ShopResponse::for_viewer(s, &caller)),
    ))
}

/// Get a shop
#[utoipa::path(
    get,
    path = "/api/v1/toko/{id_toko}",
    params(("id_toko" = i32, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Shop", body = ApiResponse<ShopResponse>),
        (status = 404, description = "Shop not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "shops"
)]
#[instrument(skip(state))]
pub async fn get_shop(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id_toko): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<ShopResponse>>> {
    let found = shops::find(&state.db, id_toko).await?;
    Ok(respond(GET_SUCCEEDED, ShopResponse::for_viewer(found, &caller)))
}

/// Open a shop for a caller that has none
#[utoipa::path(
    post,
    path = "/api/v1/toko",
    request_body = CreateShopRequest,
    responses(
        (status = 201, description = "Shop created", body = ApiResponse<ShopResponse>),
        (status = 409, description = "Caller already has a shop", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "shops"
)]
#[instrument(skip(state))]
pub async fn create_shop(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(request): ValidJson<CreateShopRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ShopResponse>>)> {
    let created = shops::create(&state.db, caller.id, request.nama_toko).await?;
    Ok((
        StatusCode::CREATED,
        respond(POST_SUCCEEDED, ShopResponse::for_viewer(created, &caller)),
    ))
}

/// Rename a shop and optionally replace its photo
#[utoipa::path(
    put,
    path = "/api/v1/toko/{id_toko}",
    params(("id_toko" = i32, Path, description = "Shop ID")),
    request_body(content = UpdateShopForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Shop updated", body = ApiResponse<ShopResponse>),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Shop not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "shops"
)]
#[instrument(skip(state, form))]
pub async fn update_shop(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id_toko): AppPath<i32>,
    mut form: FormData,
) -> ApiResult<Json<ApiResponse<ShopResponse>>> {
    let photo = form.take_files("photo").into_iter().next();
    let updated = shops::update(
        &state.db,
        &state.media,
        id_toko,
        caller.id,
        caller.is_admin,
        form.text("nama_toko"),
        photo,
    )
    .await?;
    Ok(respond(PUT_SUCCEEDED, ShopResponse::for_viewer(updated, &caller)))
}

/// Delete a shop together with its products
#[utoipa::path(
    delete,
    path = "/api/v1/toko/{id_toko}",
    params(("id_toko" = i32, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Shop deleted", body = ApiResponse<String>),
        (status = 404, description = "Shop not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "shops"
)]
#[instrument(skip(state))]
pub async fn delete_shop(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id_toko): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    shops::delete(&state.db, &state.media, id_toko, caller.id, caller.is_admin).await?;
    Ok(respond(DELETE_SUCCEEDED, String::new()))
}
