use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Extension, Json,
};
use futures::Stream;
use uuid::Uuid;

use crate::core::booking::{self, BookingFilter};
use crate::core::lifecycle::{self, TripEvent};
use crate::entities::booking::Booking;
use crate::entities::driver::Driver;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

async fn my_profile(state: &AppState, claims: &Claims) -> AppResult<Driver> {
    state
        .store
        .drivers
        .find(|driver| driver.tenant_id == claims.tenant_id && driver.user_id == claims.sub)
        .await
        .ok_or_else(|| AppError::NotFound("No driver profile for this account".to_string()))
}

/// List bookings assigned to the logged-in driver
pub async fn my_assignments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Booking>>> {
    let profile = my_profile(&state, &claims).await?;
    let rows = booking::list_bookings(
        &state.store,
        claims.tenant_id,
        BookingFilter {
            driver_id: Some(profile.id),
            ..Default::default()
        },
    )
    .await;
    Ok(Json(rows))
}

async fn advance_own(
    state: &AppState,
    claims: &Claims,
    booking_id: Uuid,
    event: TripEvent,
) -> AppResult<Booking> {
    let profile = my_profile(state, claims).await?;
    let booking = state.store.bookings.get(claims.tenant_id, booking_id).await?;
    if booking.driver_id != Some(profile.id) {
        return Err(AppError::Forbidden(
            "You are not assigned to this booking".to_string(),
        ));
    }

    lifecycle::advance(&state.store, &state.feed, claims.tenant_id, booking_id, event).await
}

/// Begin the assigned trip
pub async fn start_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let booking = advance_own(&state, &claims, booking_id, TripEvent::Start).await?;
    Ok(Json(booking))
}

/// Finish the assigned trip
pub async fn complete_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let booking = advance_own(&state, &claims, booking_id, TripEvent::Complete).await?;
    Ok(Json(booking))
}

/// Booking change events for the driver's own assignments
pub async fn events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let profile = my_profile(&state, &claims).await?;
    Ok(super::change_stream(
        &state,
        claims.tenant_id,
        BookingFilter {
            driver_id: Some(profile.id),
            ..Default::default()
        },
    ))
}
