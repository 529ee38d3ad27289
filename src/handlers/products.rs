use axum::{extract::State, http::StatusCode, Json};
use common::{ApiResponse, ListQuery, Paginated};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

use super::categories::CategoryResponse;
use super::{respond, DELETE_SUCCEEDED, GET_SUCCEEDED, POST_SUCCEEDED, PUT_SUCCEEDED};
use crate::error::{ApiError, ApiResult};
use crate::extract::{AppPath, AppQuery, FormData, FormErrors};
use crate::middleware::AuthUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::products::{
    self, NewProduct, ProductChanges, ProductDetails, ProductFilter, SORTABLE_COLUMNS,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductShop {
    pub id: i32,
    pub nama_toko: String,
    pub url_foto: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPhoto {
    pub id: i32,
    pub product_id: i32,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub nama_produk: String,
    pub slug: String,
    pub category_id: i32,
    pub harga_reseller: String,
    pub harga_konsumen: String,
    pub stok: i32,
    pub deskripsi: String,
    pub shop: Option<ProductShop>,
    pub category: Option<CategoryResponse>,
    pub photos: Vec<ProductPhoto>,
}

impl From<ProductDetails> for ProductResponse {
    fn from(details: ProductDetails) -> Self {
        let product = details.product;
        Self {
            id: product.id,
            nama_produk: product.nama_produk,
            slug: product.slug,
            category_id: product.id_category,
            harga_reseller: product.harga_reseller,
            harga_konsumen: product.harga_konsumen,
            stok: product.stok,
            deskripsi: product.deskripsi,
            shop: details.shop.map(|s| ProductShop {
                id: s.id,
                nama_toko: s.nama_toko,
                url_foto: s.url_foto,
            }),
            category: details.category.map(CategoryResponse::from),
            photos: details
                .photos
                .into_iter()
                .map(|p| ProductPhoto {
                    id: p.id,
                    product_id: p.id_produk,
                    url: p.url,
                })
                .collect(),
        }
    }
}

/// Catalog filters, combined with the common list parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category_id: Option<i32>,
    pub toko_id: Option<i32>,
    /// Inclusive lower bound on `harga_konsumen`
    pub min_harga: Option<i64>,
    /// Inclusive upper bound on `harga_konsumen`
    pub max_harga: Option<i64>,
}

/// Multipart body of a product create or update. Every field is required on
/// create and optional on update; repeat `photos` for several files.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ProductForm {
    pub nama_produk: String,
    pub slug: Option<String>,
    pub category_id: i32,
    pub harga_reseller: String,
    pub harga_konsumen: String,
    pub stok: i32,
    pub deskripsi: String,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub photos: Vec<Vec<u8>>,
}

fn parse_new_product(form: &FormData) -> ApiResult<NewProduct> {
    let mut errors = FormErrors::default();

    let nama_produk = errors.required(form, "nama_produk", form.text("nama_produk"));
    let category_id = errors.number(form, "category_id");
    let category_id = errors.required(form, "category_id", category_id);
    let harga_reseller = errors.price(form, "harga_reseller");
    let harga_reseller = errors.required(form, "harga_reseller", harga_reseller);
    let harga_konsumen = errors.price(form, "harga_konsumen");
    let harga_konsumen = errors.required(form, "harga_konsumen", harga_konsumen);
    let stok = errors.count(form, "stok");
    let stok = errors.required(form, "stok", stok);
    let deskripsi = errors.required(form, "deskripsi", form.text("deskripsi"));
    errors.finish()?;

    match (nama_produk, category_id, harga_reseller, harga_konsumen, stok, deskripsi) {
        (
            Some(nama_produk),
            Some(category_id),
            Some(harga_reseller),
            Some(harga_konsumen),
            Some(stok),
            Some(deskripsi),
        ) => Ok(NewProduct {
            nama_produk,
            slug: form.text("slug"),
            category_id,
            harga_reseller,
            harga_konsumen,
            stok,
            deskripsi,
        }),
        _ => Err(ApiError::bad_request("Invalid product form")),
    }
}

fn parse_product_changes(form: &FormData) -> ApiResult<ProductChanges> {
    let mut errors = FormErrors::default();
    let changes = ProductChanges {
        nama_produk: form.text("nama_produk"),
        slug: form.text("slug"),
        category_id: errors.number(form, "category_id"),
        harga_reseller: errors.price(form, "harga_reseller"),
        harga_konsumen: errors.price(form, "harga_konsumen"),
        stok: errors.count(form, "stok"),
        deskripsi: form.text("deskripsi"),
    };
    errors.finish()?;
    Ok(changes)
}

/// List a product in the caller's shop
#[utoipa::path(
    post,
    path = "/api/v1/product",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Caller has no shop or category not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "products"
)]
#[instrument(skip(state, form))]
pub async fn create_product(
    State(state): State<AppState>,
    caller: AuthUser,
    mut form: FormData,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProductResponse>>)> {
    let input = parse_new_product(&form)?;
    let photos = form.take_files("photos");
    debug!("Creating product '{}' with {} photos", input.nama_produk, photos.len());

    let created = products::create(&state.db, &state.media, caller.id, input, photos).await?;
    Ok((StatusCode::CREATED, respond(POST_SUCCEEDED, created.into())))
}

/// Browse the catalog
#[utoipa::path(
    get,
    path = "/api/v1/product",
    params(ListQuery, ProductQuery),
    responses(
        (status = 200, description = "Page of products", body = ApiResponse<Paginated<ProductResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "products"
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
    AppQuery(catalog): AppQuery<ProductQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<ProductResponse>>>> {
    let filter = query.resolve(SORTABLE_COLUMNS)?;
    let catalog = ProductFilter {
        category_id: catalog.category_id,
        toko_id: catalog.toko_id,
        min_harga: catalog.min_harga,
        max_harga: catalog.max_harga,
    };

    let page = products::list(&state.db, &filter, &catalog).await?;
    info!("Retrieved {} of {} products", page.data.len(), page.total_data);
    Ok(respond(GET_SUCCEEDED, page.map(ProductResponse::from)))
}

/// Get a product
#[utoipa::path(
    get,
    path = "/api/v1/product/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "products"
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<ProductResponse>>> {
    let found = products::details(&state.db, id).await?;
    Ok(respond(GET_SUCCEEDED, found.into()))
}

/// Partially update a product of the caller's shop
#[utoipa::path(
    put,
    path = "/api/v1/product/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "products"
)]
#[instrument(skip(state, form))]
pub async fn update_product(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<i32>,
    mut form: FormData,
) -> ApiResult<Json<ApiResponse<ProductResponse>>> {
    let changes = parse_product_changes(&form)?;
    let photos = form.take_files("photos");

    let updated = products::update(
        &state.db,
        &state.media,
        id,
        caller.id,
        caller.is_admin,
        changes,
        photos,
    )
    .await?;
    Ok(respond(PUT_SUCCEEDED, updated.into()))
}

/// Delete a product of the caller's shop
#[utoipa::path(
    delete,
    path = "/api/v1/product/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<String>),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "products"
)]
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    products::delete(&state.db, &state.media, id, caller.id, caller.is_admin).await?;
    Ok(respond(DELETE_SUCCEEDED, String::new()))
}
