use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::config::AppConfig;
use crate::handlers::{addresses, auth, categories, products, provcity, shops, trx, users};
use crate::services::provcity::{City, Province, RegionDirectory};
use crate::uploads::MediaStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// Process-wide token bucket
    pub rate_limiter: Arc<DefaultDirectRateLimiter>,
    /// Province/city lookups
    pub regions: Arc<dyn RegionDirectory>,
    /// Uploaded photos on disk
    pub media: MediaStore,
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub status: bool,
    /// Always "Failed to process request"
    pub message: String,
    pub errors: Vec<String>,
    /// Always null
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        components.add_security_scheme(
            "basic",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        auth::register,
        auth::login,
        auth::verify_token,
        auth::logout,
        users::get_profile,
        users::update_profile,
        users::delete_profile,
        users::list_users,
        users::get_user,
        users::delete_user,
        addresses::create_address,
        addresses::list_addresses,
        addresses::get_address,
        addresses::update_address,
        addresses::delete_address,
        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        shops::my_shop,
        shops::list_shops,
        shops::get_shop,
        shops::create_shop,
        shops::update_shop,
        shops::delete_shop,
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
        trx::create_trx,
        trx::list_trx,
        trx::get_trx,
        provcity::list_provinces,
        provcity::list_cities,
        provcity::get_province,
        provcity::get_city,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::VerifyTokenResponse,
            auth::LogoutResponse,
            users::UserResponse,
            users::UpdateProfileRequest,
            addresses::AddressResponse,
            addresses::CreateAddressRequest,
            addresses::UpdateAddressRequest,
            categories::CategoryResponse,
            categories::CategoryRequest,
            shops::ShopResponse,
            shops::CreateShopRequest,
            shops::UpdateShopForm,
            products::ProductResponse,
            products::ProductShop,
            products::ProductPhoto,
            products::ProductForm,
            trx::CreateTrxRequest,
            trx::OrderLineRequest,
            trx::TrxResponse,
            trx::TrxLineResponse,
            trx::TrxProduct,
            trx::TrxShop,
            Province,
            City,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and token lifecycle"),
        (name = "users", description = "Account profile and admin account management"),
        (name = "addresses", description = "Shipping addresses of the caller"),
        (name = "categories", description = "Product categories (admin)"),
        (name = "shops", description = "Shops (toko)"),
        (name = "products", description = "Product catalog"),
        (name = "trx", description = "Orders"),
        (name = "provcity", description = "Indonesian provinces and cities"),
    ),
    info(
        title = "Evermos API",
        description = "Marketplace backend: accounts, shops, products, addresses and orders"
    )
)]
pub struct ApiDoc;
