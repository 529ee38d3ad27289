use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use common::ApiResponse;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    addresses, auth, categories, health::health_check, products, provcity, shops, trx, users,
};
use crate::middleware::{
    basic_auth, handle_panic, jwt_auth, rate_limit, request_id, require_admin, REQUEST_ID_HEADER,
};
use crate::schemas::{ApiDoc, AppState};

pub const API_PREFIX: &str = "/api/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

async fn endpoint_not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure(
            "Endpoint not found",
            vec!["Please check the URL or HTTP method used".to_string()],
        )),
    )
}

fn api_routes(state: &AppState) -> Router<AppState> {
    let basic = from_fn_with_state(state.clone(), basic_auth);
    let jwt = from_fn_with_state(state.clone(), jwt_auth);

    let credentials = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route_layer(basic);

    let admin = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .route(
            "/category",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/category/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route_layer(from_fn(require_admin))
        .route_layer(jwt.clone());

    let members = Router::new()
        .route("/auth/verify-token", get(auth::verify_token))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/user",
            get(users::get_profile)
                .put(users::update_profile)
                .delete(users::delete_profile),
        )
        .route(
            "/user/alamat",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/user/alamat/:id",
            get(addresses::get_address)
                .put(addresses::update_address)
                .delete(addresses::delete_address),
        )
        .route("/toko/my", get(shops::my_shop))
        .route("/toko", get(shops::list_shops).post(shops::create_shop))
        .route(
            "/toko/:id_toko",
            get(shops::get_shop)
                .put(shops::update_shop)
                .delete(shops::delete_shop),
        )
        .route(
            "/product",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/product/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/trx", get(trx::list_trx).post(trx::create_trx))
        .route("/trx/:id", get(trx::get_trx))
        .route_layer(jwt);

    let public = Router::new()
        .route("/provcity/listprovincies", get(provcity::list_provinces))
        .route("/provcity/listcities/:prov_id", get(provcity::list_cities))
        .route("/provcity/detailprovince/:prov_id", get(provcity::get_province))
        .route("/provcity/detailcity/:city_id", get(provcity::get_city));

    Router::new()
        .merge(credentials)
        .merge(admin)
        .merge(members)
        .merge(public)
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(&REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
            info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis() as u64,
                "request completed"
            );
        });

    Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, api_routes(&state))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(endpoint_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id))
                .layer(trace)
                .layer(CorsLayer::permissive())
                .layer(from_fn_with_state(state.clone(), rate_limit))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
