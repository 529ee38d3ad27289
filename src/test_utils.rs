use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD, Engine};
use migration::{Migrator, MigratorTrait};
use model::entities::{address, category, product, shop, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use crate::config::{
    AppConfig, AuthConfig, BasicAuthConfig, DatabaseConfig, JwtConfig, LoggerConfig,
    ProvcityConfig, RateLimiterConfig, ShutdownConfig, Stage, UploadsConfig,
};
use crate::router::create_router;
use crate::schemas::AppState;
use crate::services::auth::{hash_password, issue_token};
use crate::services::provcity::{validate_id, City, Province, RegionDirectory, RegionError};

pub const BASIC_USER: &str = "operator";
pub const BASIC_PASSWORD: &str = "operator-secret";
/// Plain password of every account made by `insert_user`.
pub const PASSWORD: &str = "secret";

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Configuration with generous rate limits and a throwaway uploads dir.
pub fn test_config() -> AppConfig {
    let uploads = std::env::temp_dir().join(format!("evermos-test-{}", Uuid::new_v4()));
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 8000,
        environment: Stage::Test,
        version: "test".to_string(),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        logger: LoggerConfig {
            level: "warn".to_string(),
        },
        auth: AuthConfig {
            jwt: JwtConfig {
                secret_key: "test-secret".to_string(),
                expire_in_minutes: 60,
            },
            basic: BasicAuthConfig {
                username: BASIC_USER.to_string(),
                password: BASIC_PASSWORD.to_string(),
            },
        },
        rate_limiter: RateLimiterConfig {
            rps: 1000,
            bursts: 1000,
        },
        provcity: ProvcityConfig {
            base_url: "http://127.0.0.1:9/unused".to_string(),
        },
        uploads: UploadsConfig {
            dir: uploads.to_string_lossy().into_owned(),
        },
        shutdown: ShutdownConfig {
            grace_period_secs: 1,
        },
    }
}

/// Fixed two-province directory.
pub struct FakeRegions;

fn provinces() -> Vec<Province> {
    vec![
        Province {
            id: "11".to_string(),
            name: "ACEH".to_string(),
        },
        Province {
            id: "31".to_string(),
            name: "DKI JAKARTA".to_string(),
        },
    ]
}

fn cities() -> Vec<City> {
    vec![
        City {
            id: "3171".to_string(),
            province_id: "31".to_string(),
            name: "KOTA JAKARTA SELATAN".to_string(),
        },
        City {
            id: "3172".to_string(),
            province_id: "31".to_string(),
            name: "KOTA JAKARTA TIMUR".to_string(),
        },
    ]
}

#[async_trait]
impl RegionDirectory for FakeRegions {
    async fn provinces(&self) -> Result<Vec<Province>, RegionError> {
        Ok(provinces())
    }

    async fn cities(&self, province_id: &str) -> Result<Vec<City>, RegionError> {
        validate_id(province_id)?;
        if !provinces().iter().any(|p| p.id == province_id) {
            return Err(RegionError::NotFound("province".to_string()));
        }
        Ok(cities().into_iter().filter(|c| c.province_id == province_id).collect())
    }

    async fn province(&self, id: &str) -> Result<Province, RegionError> {
        validate_id(id)?;
        provinces()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| RegionError::NotFound("province".to_string()))
    }

    async fn city(&self, id: &str) -> Result<City, RegionError> {
        validate_id(id)?;
        cities()
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| RegionError::NotFound("city".to_string()))
    }
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> AppState {
    setup_test_app_state_with(test_config()).await
}

pub async fn setup_test_app_state_with(config: AppConfig) -> AppState {
    let db = setup_test_db().await;
    crate::config::build_app_state(db, config, Arc::new(FakeRegions))
        .expect("Failed to build test app state")
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is taken from RUST_LOG, defaulting to WARN.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Create axum app for testing
pub async fn setup_test_app() -> (Router, AppState) {
    let state = setup_test_app_state().await;
    (create_router(state.clone()), state)
}

/// Test server plus the state behind it, for seeding rows directly.
pub async fn setup_test_server() -> (TestServer, AppState) {
    let (app, state) = setup_test_app().await;
    let server = TestServer::new(app).expect("Failed to start test server");
    (server, state)
}

pub async fn insert_user(db: &DatabaseConnection, notelp: &str, is_admin: bool) -> user::Model {
    user::ActiveModel {
        nama: Set(format!("User {notelp}")),
        kata_sandi: Set(hash_password(PASSWORD).expect("Failed to hash password")),
        notelp: Set(notelp.to_string()),
        tanggal_lahir: Set(None),
        jenis_kelamin: Set(None),
        tentang: Set(None),
        pekerjaan: Set(None),
        email: Set(format!("{notelp}@example.com")),
        id_provinsi: Set(None),
        id_kota: Set(None),
        is_admin: Set(is_admin),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

pub async fn insert_shop(db: &DatabaseConnection, user_id: i32, nama_toko: &str) -> shop::Model {
    shop::ActiveModel {
        id_user: Set(user_id),
        nama_toko: Set(nama_toko.to_string()),
        url_foto: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test shop")
}

pub async fn insert_category(db: &DatabaseConnection, nama_category: &str) -> category::Model {
    category::ActiveModel {
        nama_category: Set(nama_category.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test category")
}

pub async fn insert_product(
    db: &DatabaseConnection,
    shop_id: i32,
    category_id: i32,
    nama_produk: &str,
    harga_konsumen: &str,
) -> product::Model {
    product::ActiveModel {
        nama_produk: Set(nama_produk.to_string()),
        slug: Set(nama_produk.to_lowercase().replace(' ', "-")),
        harga_reseller: Set(harga_konsumen.to_string()),
        harga_konsumen: Set(harga_konsumen.to_string()),
        stok: Set(10),
        deskripsi: Set(format!("{nama_produk} for testing")),
        id_toko: Set(shop_id),
        id_category: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test product")
}

pub async fn insert_address(db: &DatabaseConnection, user_id: i32) -> address::Model {
    address::ActiveModel {
        id_user: Set(user_id),
        judul_alamat: Set("Rumah".to_string()),
        nama_penerima: Set("Budi".to_string()),
        no_telp: Set("0812".to_string()),
        detail_alamat: Set("Jl. Merdeka 1".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test address")
}

/// Signed token for `account` under the test JWT secret.
pub fn token_for(state: &AppState, account: &user::Model) -> String {
    issue_token(&state.config.auth.jwt, account)
        .expect("Failed to issue test token")
        .0
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header"),
    )
}

/// Operator credentials accepted by the basic-auth routes.
pub fn basic_header() -> (HeaderName, HeaderValue) {
    basic_header_for(BASIC_USER, BASIC_PASSWORD)
}

pub fn basic_header_for(username: &str, password: &str) -> (HeaderName, HeaderValue) {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Basic {encoded}")).expect("credentials are a valid header"),
    )
}
