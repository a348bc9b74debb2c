use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{Booking, BookingDetails, BookingStatus, PaymentMethod};
use crate::entities::route::ServiceKind;
use crate::entities::tenant::Tenant;
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::store::Store;
use crate::utils::geo::is_within_radius;

use super::pricing::{self, Quote};

/// Customer-facing booking request: a published route or an ad-hoc kind
/// with its own details.
#[derive(Clone, Debug, Deserialize)]
pub struct NewBooking {
    pub route_id: Option<Uuid>,
    pub details: BookingDetails,
    pub payment_method: PaymentMethod,
}

/// Listing filter, also used to scope change observers.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct BookingFilter {
    pub customer_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.customer_id.is_none_or(|id| booking.customer_id == id)
            && self.driver_id.is_none_or(|id| booking.driver_id == Some(id))
            && self.status.is_none_or(|status| booking.status == status)
    }
}

fn kind_of(details: &BookingDetails) -> ServiceKind {
    match details {
        BookingDetails::ScheduledSeat { .. } => ServiceKind::ScheduledSeat,
        BookingDetails::Private { .. } => ServiceKind::Private,
        BookingDetails::Parcel { .. } => ServiceKind::Parcel,
        BookingDetails::PointToPoint { .. } => ServiceKind::PointToPoint,
        BookingDetails::AirportTransfer { .. } => ServiceKind::AirportTransfer,
    }
}

fn validate(details: &BookingDetails, tenant: &Tenant) -> AppResult<()> {
    if details.seats() == 0 {
        return Err(AppError::Validation(
            "booking must carry at least one passenger".to_string(),
        ));
    }

    match details {
        BookingDetails::Parcel {
            weight_kg,
            pickup_address,
            dropoff_address,
            ..
        } => {
            if *weight_kg <= 0.0 {
                return Err(AppError::Validation(
                    "parcel weight must be positive".to_string(),
                ));
            }
            if pickup_address.trim().is_empty() || dropoff_address.trim().is_empty() {
                return Err(AppError::Validation(
                    "parcel pickup and dropoff addresses are required".to_string(),
                ));
            }
        }
        BookingDetails::AirportTransfer { flight_number, .. } => {
            if flight_number.trim().is_empty() {
                return Err(AppError::Validation("flight number is required".to_string()));
            }
        }
        _ => {}
    }

    if let Some(pickup) = details.pickup_point() {
        if !is_within_radius(
            pickup.lat,
            pickup.lng,
            tenant.center.lat,
            tenant.center.lng,
            tenant.service_radius_km,
        ) {
            return Err(AppError::Validation(format!(
                "pickup must be within {} km of the {} service area",
                tenant.service_radius_km, tenant.name
            )));
        }
    }

    Ok(())
}

/// Create a booking in the Pending state. Scheduled-seat bookings reserve
/// their seats here, under the route table's write lock, so inventory can
/// never go negative.
pub async fn create_booking(
    store: &Store,
    tenant_id: Uuid,
    customer_id: Uuid,
    role: UserRole,
    request: NewBooking,
) -> AppResult<Booking> {
    let tenant = store.tenant(tenant_id).await?;
    validate(&request.details, &tenant)?;

    let kind = kind_of(&request.details);
    let (adults, children) = match &request.details {
        BookingDetails::ScheduledSeat { adults, children, .. } => (*adults, *children),
        other => (other.seats(), 0),
    };

    let price = match request.route_id {
        Some(route_id) => {
            let mut routes = store.routes.write().await;
            let route = routes
                .get_mut(&route_id)
                .filter(|route| route.tenant_id == tenant_id)
                .ok_or_else(|| AppError::NotFound(format!("route {route_id} not found")))?;

            if route.kind != kind {
                return Err(AppError::Validation(format!(
                    "booking details do not match the {} service kind",
                    route.name
                )));
            }

            let quote = pricing::total(route, role, &tenant, adults, children);

            if route.kind == ServiceKind::ScheduledSeat {
                let seats = request.details.seats();
                if let Some(available) = route.seats_available {
                    if available < seats {
                        return Err(AppError::CapacityExceeded(format!(
                            "only {available} seats left on {}",
                            route.name
                        )));
                    }
                    route.seats_available = Some(available - seats);
                }
            }

            quote.total
        }
        None => match kind {
            ServiceKind::ScheduledSeat | ServiceKind::Private => {
                return Err(AppError::Validation(format!(
                    "{kind:?} bookings require a route"
                )));
            }
            _ => match (request.details.pickup_point(), request.details.dropoff_point()) {
                (Some(pickup), Some(dropoff)) => {
                    pricing::adhoc_fare(&tenant, role, pickup, dropoff)
                }
                // Address-only parcels are metered at dispatch time; charge
                // the flag-fall up front.
                _ => pricing::round_money(tenant.base_fare),
            },
        },
    };

    let booking = Booking {
        id: Uuid::new_v4(),
        tenant_id,
        customer_id,
        route_id: request.route_id,
        status: BookingStatus::Pending,
        driver_id: None,
        vehicle_id: None,
        details: request.details,
        price,
        payment_method: request.payment_method,
        created_at: Utc::now(),
        completed_at: None,
    };
    store.bookings.put(booking.clone()).await;

    tracing::info!(
        booking_id = %booking.id,
        tenant_id = %tenant_id,
        kind = ?kind,
        price = booking.price,
        "booking created"
    );

    Ok(booking)
}

pub async fn list_bookings(store: &Store, tenant_id: Uuid, filter: BookingFilter) -> Vec<Booking> {
    let mut rows = store
        .bookings
        .list(tenant_id, |booking| filter.matches(booking))
        .await;
    rows.sort_by_key(|booking| booking.created_at);
    rows
}

/// Price breakdown for a route, without touching any inventory.
pub async fn quote(
    store: &Store,
    tenant_id: Uuid,
    role: UserRole,
    route_id: Uuid,
    adults: u32,
    children: u32,
) -> AppResult<Quote> {
    let tenant = store.tenant(tenant_id).await?;
    let route = store.routes.get(tenant_id, route_id).await?;
    Ok(pricing::total(&route, role, &tenant, adults, children))
}
