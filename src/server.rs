//! # Server Configuration
//!
//! Router assembly, shared state and the OpenAPI document for the Kontena API.

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::tenant_middleware;
use crate::config::AppConfig;
use crate::handlers::{
    self, assets, assignments, categories, lifecycle, locations, maintenance, people, procurement,
    purchase_orders, tenants, vendors,
};
use crate::services::LifecycleService;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub lifecycle: Arc<LifecycleService>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let lifecycle = LifecycleService::from_config(db.clone(), &config.lifecycle);
        Self {
            config: Arc::new(config),
            db,
            lifecycle: Arc::new(lifecycle),
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::health))
        .route(
            "/api/v1/tenants",
            get(tenants::list_tenants).post(tenants::create_tenant),
        )
        .route("/api/v1/tenants/{id}", get(tenants::get_tenant))
        .merge(tenant_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Routes that require `X-Tenant-Id`.
fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/people",
            get(people::list_people).post(people::create_person),
        )
        .route(
            "/api/v1/people/{id}",
            get(people::get_person).delete(people::delete_person),
        )
        .route(
            "/api/v1/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/v1/categories/{id}",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/v1/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/api/v1/locations/{id}",
            get(locations::get_location)
                .patch(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/api/v1/vendors",
            get(vendors::list_vendors).post(vendors::create_vendor),
        )
        .route(
            "/api/v1/vendors/{id}",
            get(vendors::get_vendor)
                .patch(vendors::update_vendor)
                .delete(vendors::delete_vendor),
        )
        .route(
            "/api/v1/assets",
            get(assets::list_assets).post(assets::create_asset),
        )
        .route(
            "/api/v1/assets/{id}",
            get(assets::get_asset)
                .patch(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route(
            "/api/v1/assets/{id}/status",
            post(assets::change_asset_status),
        )
        .route(
            "/api/v1/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/api/v1/assignments/{id}",
            get(assignments::get_assignment)
                .patch(assignments::update_assignment)
                .delete(assignments::delete_assignment),
        )
        .route(
            "/api/v1/maintenance",
            get(maintenance::list_maintenance).post(maintenance::create_maintenance),
        )
        .route(
            "/api/v1/maintenance/{id}",
            get(maintenance::get_maintenance)
                .patch(maintenance::update_maintenance)
                .delete(maintenance::delete_maintenance),
        )
        .route(
            "/api/v1/procurement",
            get(procurement::list_procurement).post(procurement::create_procurement),
        )
        .route(
            "/api/v1/procurement/{id}",
            get(procurement::get_procurement)
                .patch(procurement::update_procurement)
                .delete(procurement::delete_procurement),
        )
        .route(
            "/api/v1/purchase-orders",
            get(purchase_orders::list_purchase_orders)
                .post(purchase_orders::create_purchase_order),
        )
        .route(
            "/api/v1/purchase-orders/{id}",
            get(purchase_orders::get_purchase_order)
                .delete(purchase_orders::delete_purchase_order),
        )
        .route(
            "/api/v1/lifecycle/transitions",
            get(lifecycle::list_transitions),
        )
        .route("/api/v1/lifecycle/can-delete", get(lifecycle::can_delete))
        .route_layer(middleware::from_fn(tenant_middleware))
}

/// Explicit origins when configured; permissive in local and test profiles;
/// same-origin only otherwise.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if matches!(config.profile.as_str(), "local" | "test") {
        CorsLayer::permissive()
    } else {
        tracing::warn!(
            profile = %config.profile,
            "No CORS origins configured; cross-origin requests will be rejected"
        );
        CorsLayer::new()
    }
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health,
        tenants::create_tenant,
        tenants::list_tenants,
        tenants::get_tenant,
        people::create_person,
        people::list_people,
        people::get_person,
        people::delete_person,
        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        locations::create_location,
        locations::list_locations,
        locations::get_location,
        locations::update_location,
        locations::delete_location,
        vendors::create_vendor,
        vendors::list_vendors,
        vendors::get_vendor,
        vendors::update_vendor,
        vendors::delete_vendor,
        assets::create_asset,
        assets::list_assets,
        assets::get_asset,
        assets::update_asset,
        assets::change_asset_status,
        assets::delete_asset,
        assignments::create_assignment,
        assignments::list_assignments,
        assignments::get_assignment,
        assignments::update_assignment,
        assignments::delete_assignment,
        maintenance::create_maintenance,
        maintenance::list_maintenance,
        maintenance::get_maintenance,
        maintenance::update_maintenance,
        maintenance::delete_maintenance,
        procurement::create_procurement,
        procurement::list_procurement,
        procurement::get_procurement,
        procurement::update_procurement,
        procurement::delete_procurement,
        purchase_orders::create_purchase_order,
        purchase_orders::list_purchase_orders,
        purchase_orders::get_purchase_order,
        purchase_orders::delete_purchase_order,
        lifecycle::list_transitions,
        lifecycle::can_delete,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            handlers::HealthStatus,
            crate::lifecycle::EntityKind,
            crate::lifecycle::AssetStatus,
            crate::lifecycle::AssignmentStatus,
            crate::lifecycle::MaintenanceStatus,
            crate::lifecycle::MaintenanceType,
            crate::lifecycle::ProcurementStatus,
            tenants::CreateTenantRequestDto,
            tenants::TenantDto,
            tenants::TenantsResponse,
            people::CreatePersonDto,
            people::PersonDto,
            categories::CreateCategoryDto,
            categories::UpdateCategoryDto,
            categories::CategoryDto,
            locations::CreateLocationDto,
            locations::UpdateLocationDto,
            locations::LocationDto,
            vendors::VendorFieldsDto,
            vendors::VendorDto,
            assets::CreateAssetDto,
            assets::UpdateAssetDto,
            assets::AssetStatusChangeDto,
            assets::AssetDto,
            assignments::CreateAssignmentDto,
            assignments::UpdateAssignmentDto,
            assignments::AssignmentDto,
            maintenance::CreateMaintenanceDto,
            maintenance::UpdateMaintenanceDto,
            maintenance::MaintenanceDto,
            procurement::CreateProcurementItemDto,
            procurement::CreateProcurementDto,
            procurement::UpdateProcurementDto,
            procurement::ProcurementItemDto,
            procurement::ProcurementDto,
            procurement::ProcurementDetailDto,
            purchase_orders::CreatePurchaseOrderDto,
            purchase_orders::PurchaseOrderDto,
            lifecycle::TransitionsDto,
            lifecycle::CanDeleteDto,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "tenants", description = "Tenant management"),
        (name = "people", description = "People who hold or request assets"),
        (name = "categories", description = "Asset category tree"),
        (name = "locations", description = "Location tree"),
        (name = "vendors", description = "Suppliers"),
        (name = "assets", description = "Assets and direct status changes"),
        (name = "assignments", description = "Handing assets to people"),
        (name = "maintenance", description = "Maintenance records"),
        (name = "procurement", description = "Procurement requests and approval"),
        (name = "purchase-orders", description = "Purchase orders"),
        (name = "lifecycle", description = "Status tables and deletion checks"),
    ),
    info(
        title = "Kontena API",
        description = "Asset and procurement lifecycle service",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_lifecycle_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/assets/{id}/status",
            "/api/v1/procurement/{id}",
            "/api/v1/lifecycle/transitions",
            "/api/v1/lifecycle/can-delete",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn cors_accepts_configured_origins() {
        let config = AppConfig {
            profile: "prod".to_string(),
            cors_allowed_origins: vec!["https://app.example.com".to_string(), " ".to_string()],
            ..AppConfig::default()
        };
        // Building the layer must not panic on blank entries.
        let _ = cors_layer(&config);
    }
}
