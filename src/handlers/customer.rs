use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    Extension, Json,
};
use futures::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::booking::{self, BookingFilter, NewBooking};
use crate::core::lifecycle::{self, TripEvent};
use crate::core::pricing::Quote;
use crate::entities::booking::Booking;
use crate::entities::location::LocationSample;
use crate::entities::route::Route;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

/// List the tenant's published services
pub async fn list_routes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Route>>> {
    let mut routes = state.store.routes.list(claims.tenant_id, |_| true).await;
    routes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(routes))
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

/// Price breakdown for a route, for the requesting user
pub async fn quote_route(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(route_id): Path<Uuid>,
    Query(params): Query<QuoteParams>,
) -> AppResult<Json<Quote>> {
    let quote = booking::quote(
        &state.store,
        claims.tenant_id,
        claims.role,
        route_id,
        params.adults,
        params.children,
    )
    .await?;
    Ok(Json(quote))
}

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewBooking>,
) -> AppResult<Json<Booking>> {
    let booking = booking::create_booking(
        &state.store,
        claims.tenant_id,
        claims.sub,
        claims.role,
        payload,
    )
    .await?;
    Ok(Json(booking))
}

/// List the caller's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Booking>>> {
    let rows = booking::list_bookings(
        &state.store,
        claims.tenant_id,
        BookingFilter {
            customer_id: Some(claims.sub),
            ..Default::default()
        },
    )
    .await;
    Ok(Json(rows))
}

async fn owned_booking(state: &AppState, claims: &Claims, booking_id: Uuid) -> AppResult<Booking> {
    let booking = state.store.bookings.get(claims.tenant_id, booking_id).await?;
    if booking.customer_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only manage your own bookings".to_string(),
        ));
    }
    Ok(booking)
}

/// Cancel an own booking (pending or confirmed)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    owned_booking(&state, &claims, booking_id).await?;
    let cancelled = lifecycle::advance(
        &state.store,
        &state.feed,
        claims.tenant_id,
        booking_id,
        TripEvent::Cancel,
    )
    .await?;
    Ok(Json(cancelled))
}

/// Current driver position for an own in-progress booking; null once the
/// trip is over.
pub async fn booking_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Option<LocationSample>>> {
    owned_booking(&state, &claims, booking_id).await?;
    let sample = state.store.samples.get(claims.tenant_id, booking_id).await.ok();
    Ok(Json(sample))
}

/// Booking change events for the caller's own bookings
pub async fn events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    super::change_stream(
        &state,
        claims.tenant_id,
        BookingFilter {
            customer_id: Some(claims.sub),
            ..Default::default()
        },
    )
}
