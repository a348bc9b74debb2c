use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, customer, driver, operator};
use crate::middleware::auth::{
    auth_middleware, require_admin, require_customer, require_driver, require_operator,
};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Role-specific governor layers
    let customer_governor = create_role_governor(RateLimitedRole::Customer);
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    // IP-based governor for unauthenticated routes
    let public_governor = create_public_governor();

    // Public routes (per-IP rate limiting)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let public_routes = Router::new()
        .route("/tenants", get(auth::list_tenants))
        .layer(public_governor);

    // Customer routes (requires auth + customer role)
    let customer_routes = Router::new()
        .route("/routes", get(customer::list_routes))
        .route("/routes/{id}/quote", get(customer::quote_route))
        .route("/bookings", post(customer::create_booking))
        .route("/bookings", get(customer::my_bookings))
        .route("/bookings/{id}", delete(customer::cancel_booking))
        .route("/bookings/{id}/location", get(customer::booking_location))
        .route("/events", get(customer::events))
        .layer(customer_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver routes (requires auth + driver role)
    let driver_routes = Router::new()
        .route("/assignments", get(driver::my_assignments))
        .route("/assignments/{id}/start", post(driver::start_trip))
        .route("/assignments/{id}/complete", post(driver::complete_trip))
        .route("/events", get(driver::events))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Operator routes (requires auth + operator or admin role)
    let operator_routes = Router::new()
        .route("/bookings", get(operator::list_bookings))
        .route("/bookings/{id}/assign", post(operator::assign))
        .route("/bookings/{id}/auto-assign", post(operator::auto_assign))
        .route("/bookings/{id}/advance", post(operator::advance))
        .route("/drivers", get(operator::list_drivers))
        .route("/vehicles", get(operator::list_vehicles))
        .route("/invoices", get(operator::list_invoices))
        .route("/events", get(operator::events))
        .layer(middleware::from_fn(require_operator))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Tenants
        .route("/tenants", post(admin::create_tenant))
        // Routes/services
        .route("/routes", get(admin::list_routes))
        .route("/routes", post(admin::create_route))
        .route("/routes/{id}", put(admin::update_route))
        .route("/routes/{id}", delete(admin::delete_route))
        // Fleet
        .route("/vehicles", post(admin::create_vehicle))
        .route("/vehicles/{id}/status", put(admin::set_vehicle_status))
        .route("/drivers", post(admin::create_driver))
        // Users
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}", delete(admin::delete_user))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/customer", customer_routes)
        .nest("/api/driver", driver_routes)
        .nest("/api/operator", operator_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
