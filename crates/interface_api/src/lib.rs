//! HTTP API Layer
//!
//! This crate exposes the poultry ledger services over HTTP using Axum. It
//! stands in for the counter client: every service operation has a JSON
//! endpoint that answers with the operation's `ServiceResult` envelope.
//!
//! # Architecture
//!
//! - **Handlers**: one module per resource, each a thin call into a service
//! - **Middleware**: request ids, tracing, audit logging
//! - **Settings**: the operator preferences file, held in the shared state
//! - **Error Handling**: HTTP status derived from the result's error kind
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(provider, clock, settings);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod settings;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::Clock;
use domain_ledger::{CustomerService, InvoiceService, TruckLoadService, UnitOfWorkProvider};

use crate::handlers::{customers, health, invoices, reports, settings as settings_handlers, truck_loads, trucks};
use crate::middleware::audit_middleware;
use crate::settings::SettingsStore;

/// The three ledger services over one store
pub struct LedgerServices {
    pub invoices: InvoiceService,
    pub customers: CustomerService,
    pub trucks: TruckLoadService,
}

impl LedgerServices {
    pub fn new(provider: Arc<dyn UnitOfWorkProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            invoices: InvoiceService::new(provider.clone(), clock.clone()),
            customers: CustomerService::new(provider.clone(), clock.clone()),
            trucks: TruckLoadService::new(provider, clock),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<LedgerServices>,
    pub provider: Arc<dyn UnitOfWorkProvider>,
    pub clock: Arc<dyn Clock>,
    pub settings: Arc<RwLock<SettingsStore>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn UnitOfWorkProvider>, clock: Arc<dyn Clock>, settings: SettingsStore) -> Self {
        Self {
            services: Arc::new(LedgerServices::new(provider.clone(), clock.clone())),
            provider,
            clock,
            settings: Arc::new(RwLock::new(settings)),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Services, store and settings shared by the handlers
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let customer_routes = Router::new()
        .route("/", get(customers::list_customers).post(customers::create_customer))
        .route("/search", get(customers::search_customers))
        .route(
            "/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/:id/balance", get(customers::get_balance))
        .route("/:id/summary", get(customers::get_account_summary))
        .route("/:id/payments", get(customers::list_payments).post(customers::process_payment))
        .route("/:id/invoices", get(customers::list_invoices));

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices).post(invoices::create_invoice))
        .route("/unpaid", get(invoices::list_unpaid))
        .route("/next-number", get(invoices::next_number))
        .route("/calculate", post(invoices::calculate))
        .route(
            "/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/:id/paid", post(invoices::mark_paid));

    let truck_routes = Router::new()
        .route("/", get(trucks::list_trucks).post(trucks::create_truck))
        .route("/:id", get(trucks::get_truck))
        .route("/:id/active", put(trucks::set_active))
        .route("/:id/loads", get(trucks::list_loads))
        .route("/:id/loads/:date", get(trucks::get_load_on))
        .route("/:id/weight-comparison", get(trucks::weight_comparison));

    let truck_load_routes = Router::new()
        .route("/", get(truck_loads::list_loads).post(truck_loads::create_load))
        .route(
            "/:id",
            get(truck_loads::get_load)
                .put(truck_loads::update_load)
                .delete(truck_loads::delete_load),
        )
        .route("/:id/complete", post(truck_loads::complete_load));

    let report_routes = Router::new()
        .route("/sales", get(reports::sales))
        .route("/debtors", get(reports::debtors))
        .route("/daily-summary", get(reports::daily_summary));

    let settings_routes = Router::new()
        .route("/", get(settings_handlers::get_settings).put(settings_handlers::update_settings))
        .route("/reset", post(settings_handlers::reset_settings))
        .route("/backup", get(settings_handlers::backup_status).post(settings_handlers::record_backup));

    let api_routes = Router::new()
        .nest("/customers", customer_routes)
        .nest("/invoices", invoice_routes)
        .nest("/trucks", truck_routes)
        .nest("/truck-loads", truck_load_routes)
        .nest("/reports", report_routes)
        .nest("/settings", settings_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
