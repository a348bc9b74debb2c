use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    Extension, Json,
};
use futures::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::booking::{self, BookingFilter};
use crate::core::dispatch;
use crate::core::lifecycle::{self, TripEvent};
use crate::entities::booking::Booking;
use crate::entities::driver::Driver;
use crate::entities::invoice::Invoice;
use crate::entities::vehicle::Vehicle;
use crate::error::AppResult;
use crate::utils::jwt::Claims;
use crate::AppState;

/// List bookings, optionally filtered by customer, driver or status
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<BookingFilter>,
) -> AppResult<Json<Vec<Booking>>> {
    let rows = booking::list_bookings(&state.store, claims.tenant_id, filter).await;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
}

/// Bind a named driver and vehicle to a pending booking
pub async fn assign(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<Booking>> {
    let booking = dispatch::assign(
        &state.store,
        claims.tenant_id,
        booking_id,
        payload.driver_id,
        payload.vehicle_id,
    )
    .await?;
    Ok(Json(booking))
}

/// Let the dispatcher pick the driver and vehicle
pub async fn auto_assign(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let booking = dispatch::auto_assign(&state.store, claims.tenant_id, booking_id).await?;
    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub event: TripEvent,
}

/// Drive a booking through its state machine (start, complete, cancel)
pub async fn advance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> AppResult<Json<Booking>> {
    let booking = lifecycle::advance(
        &state.store,
        &state.feed,
        claims.tenant_id,
        booking_id,
        payload.event,
    )
    .await?;
    Ok(Json(booking))
}

/// List the tenant's drivers with their live statuses
pub async fn list_drivers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Driver>>> {
    let mut drivers = state.store.drivers.list(claims.tenant_id, |_| true).await;
    drivers.sort_by_key(|driver| driver.id);
    Ok(Json(drivers))
}

/// List the tenant's vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let mut vehicles = state.store.vehicles.list(claims.tenant_id, |_| true).await;
    vehicles.sort_by_key(|vehicle| vehicle.id);
    Ok(Json(vehicles))
}

/// List recorded invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Invoice>>> {
    let mut invoices = state.store.invoices.list(claims.tenant_id, |_| true).await;
    invoices.sort_by_key(|invoice| invoice.issued_at);
    Ok(Json(invoices))
}

/// Booking change events across the whole tenant
pub async fn events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    super::change_stream(&state, claims.tenant_id, BookingFilter::default())
}
