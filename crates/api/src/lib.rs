//! HTTP API server for the soko backend.
//!
//! Wires the cart, order, and payment services over a shared
//! [`CommerceStore`] into an axum router with structured logging and
//! Prometheus metrics. Caller identity arrives pre-authenticated in the
//! `x-user-id` header; the payment callback route is the only
//! unauthenticated mutation and follows the provider's ack contract.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{CartService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{MpesaSandbox, PaymentService};
use store::CommerceStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CommerceStore> {
    pub store: S,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub payments: PaymentService<S, MpesaSandbox>,
}

/// Builds the application state from a store and a sandbox provider.
pub fn create_state<S: CommerceStore + Clone>(
    store: S,
    provider: MpesaSandbox,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        carts: CartService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        payments: PaymentService::new(store.clone(), provider),
        store,
    })
}

/// Creates the axum router with all routes and shared state.
///
/// `payment_simulation` controls whether the simulate-success escape
/// hatch is registered at all; production configuration leaves it off.
pub fn create_app<S: CommerceStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    payment_simulation: bool,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let mut router = Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/categories", get(routes::catalog::list_categories::<S>))
        .route("/api/categories/{slug}", get(routes::catalog::get_category::<S>))
        .route(
            "/api/categories/{slug}/products",
            get(routes::catalog::list_category_products::<S>),
        )
        .route("/api/products", get(routes::catalog::list_products::<S>))
        .route(
            "/api/products/featured",
            get(routes::catalog::list_featured_products::<S>),
        )
        .route("/api/products/{id}", get(routes::catalog::get_product::<S>))
        .route("/api/cart", get(routes::cart::get::<S>))
        .route("/api/cart/add", post(routes::cart::add::<S>))
        .route("/api/cart/update/{line_id}", put(routes::cart::update::<S>))
        .route("/api/cart/remove/{line_id}", delete(routes::cart::remove::<S>))
        .route("/api/cart/clear", delete(routes::cart::clear::<S>))
        .route("/api/orders", post(routes::orders::create::<S>))
        .route("/api/orders", get(routes::orders::list::<S>))
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/api/payments/mpesa/initiate",
            post(routes::payments::initiate::<S>),
        )
        .route(
            "/api/payments/mpesa/callback",
            post(routes::payments::callback::<S>),
        )
        .route(
            "/api/payments/{order_id}/status",
            get(routes::payments::status::<S>),
        );

    if payment_simulation {
        tracing::warn!("payment simulation endpoint is enabled");
        router = router.route(
            "/api/payments/mpesa/simulate-success/{order_id}",
            post(routes::payments::simulate_success::<S>),
        );
    }

    router
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
