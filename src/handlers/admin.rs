use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::driver::{Driver, DriverStatus};
use crate::entities::location::GeoPoint;
use crate::entities::route::{Route, ServiceKind};
use crate::entities::tenant::Tenant;
use crate::entities::user::{User, UserRole};
use crate::entities::vehicle::{Vehicle, VehicleKind, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Tenant Management ============

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub markup_percent: Option<f64>,
    pub center: GeoPoint,
    pub service_radius_km: f64,
    pub base_fare: f64,
    pub per_km_rate: f64,
}

/// Create a tenant (admin)
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(payload): Json<CreateTenantRequest>,
) -> AppResult<Json<Tenant>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Tenant name is required".to_string()));
    }
    if payload.service_radius_km <= 0.0 {
        return Err(AppError::Validation(
            "Service radius must be positive".to_string(),
        ));
    }

    let existing = state
        .store
        .tenants
        .find(|tenant| tenant.name == payload.name)
        .await;
    if existing.is_some() {
        return Err(AppError::Conflict("Tenant name already taken".to_string()));
    }

    let tenant = Tenant {
        id: Uuid::new_v4(),
        name: payload.name,
        markup_percent: payload.markup_percent,
        center: payload.center,
        service_radius_km: payload.service_radius_km,
        base_fare: payload.base_fare,
        per_km_rate: payload.per_km_rate,
    };
    state.store.tenants.put(tenant.clone()).await;
    tracing::info!(tenant_id = %tenant.id, name = %tenant.name, "tenant created");

    Ok(Json(tenant))
}

// ============ Route Management ============

#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    pub name: String,
    pub kind: ServiceKind,
    pub base_price: f64,
    pub child_price: Option<f64>,
    pub seats_available: Option<u32>,
    #[serde(default)]
    pub surcharges: HashMap<Uuid, f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRouteRequest {
    pub name: Option<String>,
    pub base_price: Option<f64>,
    pub child_price: Option<f64>,
    pub seats_available: Option<u32>,
}

fn check_route_shape(kind: ServiceKind, base_price: f64, seats: Option<u32>) -> AppResult<()> {
    if base_price < 0.0 {
        return Err(AppError::Validation(
            "Base price cannot be negative".to_string(),
        ));
    }
    if seats.is_some() && kind != ServiceKind::ScheduledSeat {
        return Err(AppError::Validation(
            "Only scheduled-seat services carry a seat inventory".to_string(),
        ));
    }
    Ok(())
}

/// List all routes (admin)
pub async fn list_routes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Route>>> {
    let mut routes = state.store.routes.list(claims.tenant_id, |_| true).await;
    routes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(routes))
}

/// Create a route (admin)
pub async fn create_route(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRouteRequest>,
) -> AppResult<Json<Route>> {
    check_route_shape(payload.kind, payload.base_price, payload.seats_available)?;

    let route = Route {
        id: Uuid::new_v4(),
        tenant_id: claims.tenant_id,
        name: payload.name,
        kind: payload.kind,
        base_price: payload.base_price,
        child_price: payload.child_price,
        seats_available: payload.seats_available,
        surcharges: payload.surcharges,
    };
    state.store.routes.put(route.clone()).await;
    tracing::info!(route_id = %route.id, kind = ?route.kind, "route created");

    Ok(Json(route))
}

/// Update a route (admin)
pub async fn update_route(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(route_id): Path<Uuid>,
    Json(payload): Json<UpdateRouteRequest>,
) -> AppResult<Json<Route>> {
    let mut route = state.store.routes.get(claims.tenant_id, route_id).await?;

    if let Some(name) = payload.name {
        route.name = name;
    }
    if let Some(base_price) = payload.base_price {
        route.base_price = base_price;
    }
    if payload.child_price.is_some() {
        route.child_price = payload.child_price;
    }
    if payload.seats_available.is_some() {
        route.seats_available = payload.seats_available;
    }
    check_route_shape(route.kind, route.base_price, route.seats_available)?;

    state.store.routes.put(route.clone()).await;
    Ok(Json(route))
}

/// Delete a route (admin)
pub async fn delete_route(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(route_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    state.store.routes.get(claims.tenant_id, route_id).await?;

    let open = state
        .store
        .bookings
        .list(claims.tenant_id, |booking| {
            booking.route_id == Some(route_id) && !booking.status.is_terminal()
        })
        .await;
    if !open.is_empty() {
        return Err(AppError::Conflict(
            "Route still has open bookings".to_string(),
        ));
    }

    state.store.routes.remove(route_id).await;
    Ok(Json(serde_json::json!({ "message": "Route deleted" })))
}

// ============ Vehicle Management ============

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub registration: String,
    pub kind: VehicleKind,
    pub capacity: u32,
}

#[derive(Debug, Deserialize)]
pub struct VehicleStatusRequest {
    pub status: VehicleStatus,
}

/// Register a vehicle (admin)
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVehicleRequest>,
) -> AppResult<Json<Vehicle>> {
    if payload.capacity == 0 {
        return Err(AppError::Validation(
            "Vehicle capacity must be at least one".to_string(),
        ));
    }

    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        tenant_id: claims.tenant_id,
        registration: payload.registration,
        kind: payload.kind,
        capacity: payload.capacity,
        status: VehicleStatus::Available,
    };
    state.store.vehicles.put(vehicle.clone()).await;

    Ok(Json(vehicle))
}

/// Move a vehicle between Available, Maintenance and Inactive (admin).
/// InUse is owned by the dispatcher and cannot be set by hand.
pub async fn set_vehicle_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(vehicle_id): Path<Uuid>,
    Json(payload): Json<VehicleStatusRequest>,
) -> AppResult<Json<Vehicle>> {
    if payload.status == VehicleStatus::InUse {
        return Err(AppError::Validation(
            "InUse is set by dispatch, not by hand".to_string(),
        ));
    }

    let mut vehicle = state.store.vehicles.get(claims.tenant_id, vehicle_id).await?;
    if vehicle.status == VehicleStatus::InUse {
        return Err(AppError::Conflict(
            "Vehicle is on a trip; complete or cancel it first".to_string(),
        ));
    }

    vehicle.status = payload.status;
    state.store.vehicles.put(vehicle.clone()).await;

    Ok(Json(vehicle))
}

// ============ Driver Management ============

#[derive(Debug, Deserialize)]
pub struct CreateDriverRequest {
    pub user_id: Uuid,
    pub name: String,
    pub license_number: String,
}

/// Create a driver profile for a driver-role user (admin)
pub async fn create_driver(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateDriverRequest>,
) -> AppResult<Json<Driver>> {
    let user = state.store.users.get(claims.tenant_id, payload.user_id).await?;
    if user.role != UserRole::Driver {
        return Err(AppError::Validation(
            "User does not have the driver role".to_string(),
        ));
    }

    let existing = state
        .store
        .drivers
        .find(|driver| driver.user_id == payload.user_id)
        .await;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User already has a driver profile".to_string(),
        ));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        tenant_id: claims.tenant_id,
        user_id: payload.user_id,
        name: payload.name,
        license_number: payload.license_number,
        status: DriverStatus::Free,
        vehicle_id: None,
    };
    state.store.drivers.put(driver.clone()).await;
    tracing::info!(driver_id = %driver.id, "driver profile created");

    Ok(Json(driver))
}

// ============ User Management ============

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// List all users of the tenant (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<User>>> {
    let mut users = state.store.users.list(claims.tenant_id, |_| true).await;
    users.sort_by(|a, b| a.email.cmp(&b.email));
    Ok(Json(users))
}

/// Change a user's role (admin)
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<User>> {
    let mut user = state.store.users.get(claims.tenant_id, user_id).await?;
    user.role = payload.role;
    state.store.users.put(user.clone()).await;
    Ok(Json(user))
}

/// Delete a user (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if user_id == claims.sub {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    state.store.users.get(claims.tenant_id, user_id).await?;
    state.store.users.remove(user_id).await;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
