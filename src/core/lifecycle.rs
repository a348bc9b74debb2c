use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{Booking, BookingDetails, BookingStatus};
use crate::entities::driver::DriverStatus;
use crate::entities::invoice::Invoice;
use crate::entities::vehicle::VehicleStatus;
use crate::error::{AppError, AppResult};
use crate::store::Store;

use super::feed::LocationFeed;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripEvent {
    Start,
    Complete,
    Cancel,
}

/// Drive a booking through its state machine:
/// Pending → Confirmed → InProgress → Completed, with Cancelled reachable
/// from Pending and Confirmed. (Pending → Confirmed is the dispatcher's
/// job, see `dispatch`.) An event that does not apply to the booking's
/// current state fails with `InvalidTransition` and mutates nothing, which
/// makes retries of already-applied events detectable.
pub async fn advance(
    store: &Store,
    feed: &LocationFeed,
    tenant_id: Uuid,
    booking_id: Uuid,
    event: TripEvent,
) -> AppResult<Booking> {
    match event {
        TripEvent::Start => start(store, feed, tenant_id, booking_id).await,
        TripEvent::Complete => complete(store, feed, tenant_id, booking_id).await,
        TripEvent::Cancel => cancel(store, tenant_id, booking_id).await,
    }
}

/// Confirmed → InProgress; the driver goes OnTrip and the location feed
/// begins at the pickup coordinate, or the tenant center when the booking
/// has none.
async fn start(
    store: &Store,
    feed: &LocationFeed,
    tenant_id: Uuid,
    booking_id: Uuid,
) -> AppResult<Booking> {
    let tenant = store.tenant(tenant_id).await?;

    let mut bookings = store.bookings.write().await;
    let mut drivers = store.drivers.write().await;

    let booking = bookings
        .get_mut(&booking_id)
        .filter(|booking| booking.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    if booking.status != BookingStatus::Confirmed {
        return Err(AppError::InvalidTransition(format!(
            "cannot start a booking in the {:?} state",
            booking.status
        )));
    }

    let driver_id = booking
        .driver_id
        .ok_or_else(|| AppError::Internal("confirmed booking without a driver".to_string()))?;

    booking.status = BookingStatus::InProgress;
    let snapshot = booking.clone();

    let driver = drivers
        .get_mut(&driver_id)
        .ok_or_else(|| AppError::Internal("assigned driver missing from store".to_string()))?;
    driver.status = DriverStatus::OnTrip;

    // Feed start happens before the booking lock is released, so a racing
    // complete() cannot observe InProgress without the feed being live.
    let origin = snapshot.details.pickup_point().unwrap_or(tenant.center);
    feed.start(tenant_id, driver_id, booking_id, origin).await;

    tracing::info!(%booking_id, %driver_id, "trip started");
    Ok(snapshot)
}

/// InProgress → Completed; stops the feed, frees the driver and vehicle and
/// records the invoice. The status check runs under the bookings write
/// lock, so the invoice is created exactly once no matter how often the
/// caller retries.
async fn complete(
    store: &Store,
    feed: &LocationFeed,
    tenant_id: Uuid,
    booking_id: Uuid,
) -> AppResult<Booking> {
    let mut bookings = store.bookings.write().await;
    let mut drivers = store.drivers.write().await;
    let mut vehicles = store.vehicles.write().await;

    let booking = bookings
        .get_mut(&booking_id)
        .filter(|booking| booking.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    if booking.status != BookingStatus::InProgress {
        return Err(AppError::InvalidTransition(format!(
            "cannot complete a booking in the {:?} state",
            booking.status
        )));
    }

    let driver_id = booking
        .driver_id
        .ok_or_else(|| AppError::Internal("in-progress booking without a driver".to_string()))?;
    let vehicle_id = booking
        .vehicle_id
        .ok_or_else(|| AppError::Internal("in-progress booking without a vehicle".to_string()))?;

    booking.status = BookingStatus::Completed;
    booking.completed_at = Some(Utc::now());
    let snapshot = booking.clone();

    if let Some(driver) = drivers.get_mut(&driver_id) {
        driver.status = DriverStatus::Free;
        driver.vehicle_id = None;
    }
    if let Some(vehicle) = vehicles.get_mut(&vehicle_id) {
        vehicle.status = VehicleStatus::Available;
    }

    feed.stop(driver_id, booking_id).await;

    store
        .invoices
        .put(Invoice {
            id: Uuid::new_v4(),
            tenant_id,
            booking_id,
            customer_id: snapshot.customer_id,
            amount: snapshot.price,
            payment_method: snapshot.payment_method,
            issued_at: Utc::now(),
        })
        .await;

    tracing::info!(%booking_id, %driver_id, amount = snapshot.price, "trip completed, invoice recorded");
    Ok(snapshot)
}

/// Pending/Confirmed → Cancelled. Releases any reservation, refunds seat
/// inventory for scheduled-seat bookings and records no invoice.
async fn cancel(store: &Store, tenant_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
    let mut routes = store.routes.write().await;
    let mut bookings = store.bookings.write().await;
    let mut drivers = store.drivers.write().await;
    let mut vehicles = store.vehicles.write().await;

    let booking = bookings
        .get_mut(&booking_id)
        .filter(|booking| booking.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    if !matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Confirmed
    ) {
        return Err(AppError::InvalidTransition(format!(
            "cannot cancel a booking in the {:?} state",
            booking.status
        )));
    }

    if let (Some(route_id), BookingDetails::ScheduledSeat { .. }) =
        (booking.route_id, &booking.details)
    {
        if let Some(route) = routes.get_mut(&route_id) {
            if let Some(available) = route.seats_available {
                route.seats_available = Some(available + booking.details.seats());
            }
        }
    }

    // A cancelled booking holds no resources; clear the binding so the
    // driver/vehicle reference invariants keep holding.
    if let Some(driver_id) = booking.driver_id.take() {
        if let Some(driver) = drivers.get_mut(&driver_id) {
            driver.status = DriverStatus::Free;
            driver.vehicle_id = None;
        }
    }
    if let Some(vehicle_id) = booking.vehicle_id.take() {
        if let Some(vehicle) = vehicles.get_mut(&vehicle_id) {
            vehicle.status = VehicleStatus::Available;
        }
    }

    booking.status = BookingStatus::Cancelled;
    let snapshot = booking.clone();

    tracing::info!(%booking_id, "booking cancelled");
    Ok(snapshot)
}
