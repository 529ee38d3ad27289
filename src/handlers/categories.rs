use axum::{extract::State, http::StatusCode, Json};
use common::{ApiResponse, ListQuery, Paginated};
use model::entities::category;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{respond, DELETE_SUCCEEDED, GET_SUCCEEDED, POST_SUCCEEDED, PUT_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::{AppPath, AppQuery, ValidJson};
use crate::schemas::{AppState, ErrorResponse};
use crate::services::categories::{self, SORTABLE_COLUMNS};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub nama_category: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            nama_category: model.nama_category,
        }
    }
}

/// Create and rename share the same body.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CategoryRequest {
    /// Must be unique
    #[validate(length(min = 1))]
    pub nama_category: String,
}

/// Create a category (admin)
#[utoipa::path(
    post,
    path = "/api/v1/category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "Category name already exists", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    let created = categories::create(&state.db, request.nama_category).await?;
    Ok((StatusCode::CREATED, respond(POST_SUCCEEDED, created.into())))
}

/// List categories (admin)
#[utoipa::path(
    get,
    path = "/api/v1/category",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of categories", body = ApiResponse<Paginated<CategoryResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<CategoryResponse>>>> {
    let filter = query.resolve(SORTABLE_COLUMNS)?;
    let page = categories::list(&state.db, &filter).await?;
    info!("Retrieved {} categories", page.data.len());
    Ok(respond(GET_SUCCEEDED, page.map(CategoryResponse::from)))
}

/// Get a category (admin)
#[utoipa::path(
    get,
    path = "/api/v1/category/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<CategoryResponse>>> {
    let found = categories::find(&state.db, id).await?;
    Ok(respond(GET_SUCCEEDED, found.into()))
}

/// Rename a category (admin)
#[utoipa::path(
    put,
    path = "/api/v1/category/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category name already exists", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn update_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    ValidJson(request): ValidJson<CategoryRequest>,
) -> ApiResult<Json<ApiResponse<CategoryResponse>>> {
    let updated = categories::update(&state.db, id, request.nama_category).await?;
    Ok(respond(PUT_SUCCEEDED, updated.into()))
}

/// Delete an unused category (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/category/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<String>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still has products", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "categories"
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    categories::delete(&state.db, id).await?;
    Ok(respond(DELETE_SUCCEEDED, String::new()))
}
