use axum::{middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use fleetops_api::database::models::{Courier, Delivery, Ticket, Vehicle};
use fleetops_api::handlers::{crud, health, organizations};
use fleetops_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = fleetops_api::config::config();
    tracing::info!("Starting FleetOps API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("FLEETOPS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("FleetOps API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health::health))
        // Protected API
        .merge(organization_routes())
        .merge(tenant_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn organization_routes() -> Router {
    use axum::routing::delete;
    use organizations as orgs;

    Router::new()
        .route("/api/orgs", get(orgs::list).post(orgs::create))
        .route(
            "/api/orgs/:id",
            get(orgs::show).put(orgs::update).delete(orgs::delete),
        )
        .route("/api/orgs/:id/members", get(orgs::list_members).post(orgs::add_member))
        .route("/api/orgs/:id/members/:user_id", delete(orgs::remove_member))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn tenant_routes() -> Router {
    let mut router = Router::new();
    router = router
        .merge(entity_routes::<Courier>("couriers"))
        .merge(entity_routes::<Vehicle>("vehicles"))
        .merge(entity_routes::<Delivery>("deliveries"))
        .merge(entity_routes::<Ticket>("tickets"));
    router.route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn entity_routes<T>(path: &str) -> Router
where
    T: fleetops_api::database::tenancy::TenantScoped + 'static,
{
    Router::new()
        .route(
            &format!("/api/{}", path),
            get(crud::list::<T>).post(crud::create::<T>),
        )
        .route(&format!("/api/{}/count", path), get(crud::count::<T>))
        .route(
            &format!("/api/{}/:id", path),
            get(crud::get_one::<T>)
                .put(crud::update::<T>)
                .delete(crud::delete::<T>),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "FleetOps API",
            "version": version,
            "description": "Multi-tenant fleet management backend (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "orgs": "/api/orgs[/:id] (superuser)",
                "members": "/api/orgs/:id/members[/:user_id] (superuser)",
                "couriers": "/api/couriers[/:id] (tenant)",
                "vehicles": "/api/vehicles[/:id] (tenant)",
                "deliveries": "/api/deliveries[/:id] (tenant)",
                "tickets": "/api/tickets[/:id] (tenant)",
            }
        }
    }))
}
