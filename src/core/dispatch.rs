use uuid::Uuid;

use crate::entities::booking::{Booking, BookingStatus};
use crate::entities::driver::{Driver, DriverStatus};
use crate::entities::vehicle::{Vehicle, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::store::Store;

fn bind(booking: &mut Booking, driver: &mut Driver, vehicle: &mut Vehicle) {
    booking.status = BookingStatus::Confirmed;
    booking.driver_id = Some(driver.id);
    booking.vehicle_id = Some(vehicle.id);
    driver.status = DriverStatus::Busy;
    driver.vehicle_id = Some(vehicle.id);
    vehicle.status = VehicleStatus::InUse;
}

/// Atomically bind one free driver and one available vehicle to one pending
/// booking. The whole check-then-act sequence runs under the bookings,
/// drivers and vehicles write locks (taken in the store's lock order), so
/// two dispatchers naming the same driver or vehicle serialize here and
/// exactly one of them wins.
///
/// Preconditions, first failure wins: booking exists and is Pending, driver
/// exists and is Free, vehicle exists and is Available.
pub async fn assign(
    store: &Store,
    tenant_id: Uuid,
    booking_id: Uuid,
    driver_id: Uuid,
    vehicle_id: Uuid,
) -> AppResult<Booking> {
    let mut bookings = store.bookings.write().await;
    let mut drivers = store.drivers.write().await;
    let mut vehicles = store.vehicles.write().await;

    let booking = bookings
        .get_mut(&booking_id)
        .filter(|booking| booking.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    if booking.status != BookingStatus::Pending {
        return Err(AppError::InvalidTransition(format!(
            "booking {booking_id} is {:?}, only pending bookings can be assigned",
            booking.status
        )));
    }

    let driver = drivers
        .get_mut(&driver_id)
        .filter(|driver| driver.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;
    if driver.status != DriverStatus::Free {
        return Err(AppError::ResourceUnavailable(format!(
            "driver {} is not free",
            driver.name
        )));
    }

    let vehicle = vehicles
        .get_mut(&vehicle_id)
        .filter(|vehicle| vehicle.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {vehicle_id} not found")))?;
    if vehicle.status != VehicleStatus::Available {
        return Err(AppError::ResourceUnavailable(format!(
            "vehicle {} is not available",
            vehicle.registration
        )));
    }

    bind(booking, driver, vehicle);
    tracing::info!(%booking_id, %driver_id, %vehicle_id, "booking dispatched");

    Ok(booking.clone())
}

/// Dispatch without naming resources: first free driver (lowest id) and the
/// cheapest compatible vehicle — smallest capacity that still fits the
/// party, then lowest id. Runs in the same critical section as [`assign`].
pub async fn auto_assign(store: &Store, tenant_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
    let mut bookings = store.bookings.write().await;
    let mut drivers = store.drivers.write().await;
    let mut vehicles = store.vehicles.write().await;

    let booking = bookings
        .get_mut(&booking_id)
        .filter(|booking| booking.tenant_id == tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    if booking.status != BookingStatus::Pending {
        return Err(AppError::InvalidTransition(format!(
            "booking {booking_id} is {:?}, only pending bookings can be assigned",
            booking.status
        )));
    }
    let seats = booking.details.seats();

    let driver_id = drivers
        .values()
        .filter(|driver| driver.tenant_id == tenant_id && driver.status == DriverStatus::Free)
        .map(|driver| driver.id)
        .min()
        .ok_or_else(|| AppError::ResourceUnavailable("no free driver".to_string()))?;

    let vehicle_id = vehicles
        .values()
        .filter(|vehicle| {
            vehicle.tenant_id == tenant_id
                && vehicle.status == VehicleStatus::Available
                && vehicle.capacity >= seats
        })
        .min_by_key(|vehicle| (vehicle.capacity, vehicle.id))
        .map(|vehicle| vehicle.id)
        .ok_or_else(|| {
            AppError::ResourceUnavailable(format!("no available vehicle for {seats} seats"))
        })?;

    // Both lookups just succeeded under the locks we still hold.
    let driver = drivers
        .get_mut(&driver_id)
        .ok_or_else(|| AppError::Internal("free driver vanished".to_string()))?;
    let vehicle = vehicles
        .get_mut(&vehicle_id)
        .ok_or_else(|| AppError::Internal("available vehicle vanished".to_string()))?;

    bind(booking, driver, vehicle);
    tracing::info!(%booking_id, %driver_id, %vehicle_id, "booking auto-dispatched");

    Ok(booking.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::booking::NewBooking;
    use crate::core::fixtures::{self, World};
    use crate::entities::booking::{BookingDetails, PaymentMethod};
    use crate::entities::location::GeoPoint;

    async fn pending_trip(world: &World) -> Booking {
        crate::core::booking::create_booking(
            &world.store,
            world.tenant.id,
            world.customer.id,
            world.customer.role,
            NewBooking {
                route_id: None,
                details: BookingDetails::PointToPoint {
                    passengers: 2,
                    pickup: fixtures::CENTER,
                    dropoff: GeoPoint {
                        lat: fixtures::CENTER.lat + 0.03,
                        lng: fixtures::CENTER.lng,
                    },
                },
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn assign_reserves_driver_and_vehicle() {
        let world = fixtures::world().await;
        let booking = pending_trip(&world).await;

        let confirmed = assign(
            &world.store,
            world.tenant.id,
            booking.id,
            world.driver.id,
            world.vehicle.id,
        )
        .await
        .unwrap();

        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.driver_id, Some(world.driver.id));

        let driver = world.store.drivers.get(world.tenant.id, world.driver.id).await.unwrap();
        assert_eq!(driver.status, DriverStatus::Busy);
        assert_eq!(driver.vehicle_id, Some(world.vehicle.id));

        let vehicle = world.store.vehicles.get(world.tenant.id, world.vehicle.id).await.unwrap();
        assert_eq!(vehicle.status, VehicleStatus::InUse);
    }

    #[tokio::test]
    async fn busy_driver_is_unavailable() {
        let world = fixtures::world().await;
        let first = pending_trip(&world).await;
        let second = pending_trip(&world).await;
        let spare = fixtures::sedan(world.tenant.id, uuid::Uuid::from_u128(2), 4);
        world.store.vehicles.put(spare.clone()).await;

        assign(
            &world.store,
            world.tenant.id,
            first.id,
            world.driver.id,
            world.vehicle.id,
        )
        .await
        .unwrap();

        let err = assign(
            &world.store,
            world.tenant.id,
            second.id,
            world.driver.id,
            spare.id,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable(_)));
    }

    #[tokio::test]
    async fn concurrent_assigns_for_one_driver_admit_exactly_one() {
        let world = fixtures::world().await;
        let first = pending_trip(&world).await;
        let second = pending_trip(&world).await;
        let spare = fixtures::sedan(world.tenant.id, uuid::Uuid::from_u128(2), 4);
        world.store.vehicles.put(spare.clone()).await;

        let a = assign(
            &world.store,
            world.tenant.id,
            first.id,
            world.driver.id,
            world.vehicle.id,
        );
        let b = assign(
            &world.store,
            world.tenant.id,
            second.id,
            world.driver.id,
            spare.id,
        );
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AppError::ResourceUnavailable(_))));
    }

    #[tokio::test]
    async fn assign_rejects_non_pending_booking() {
        let world = fixtures::world().await;
        let booking = pending_trip(&world).await;

        assign(
            &world.store,
            world.tenant.id,
            booking.id,
            world.driver.id,
            world.vehicle.id,
        )
        .await
        .unwrap();

        // Second attempt hits the booking precondition before the driver one.
        let err = assign(
            &world.store,
            world.tenant.id,
            booking.id,
            world.driver.id,
            world.vehicle.id,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn auto_assign_prefers_lowest_driver_and_smallest_fitting_vehicle() {
        let world = fixtures::world().await;
        let booking = pending_trip(&world).await; // party of 2

        // Higher-id driver and a mix of vehicles: a too-small bike-sized
        // sedan, a van, and the four-seater from the fixture.
        let late_driver = fixtures::driver_profile(world.tenant.id, uuid::Uuid::from_u128(9));
        world.store.drivers.put(late_driver).await;
        let tiny = fixtures::sedan(world.tenant.id, uuid::Uuid::from_u128(7), 1);
        let van = fixtures::sedan(world.tenant.id, uuid::Uuid::from_u128(8), 8);
        world.store.vehicles.put(tiny).await;
        world.store.vehicles.put(van).await;

        let confirmed = auto_assign(&world.store, world.tenant.id, booking.id)
            .await
            .unwrap();

        assert_eq!(confirmed.driver_id, Some(world.driver.id)); // id 1
        assert_eq!(confirmed.vehicle_id, Some(world.vehicle.id)); // capacity 4 beats 8, fits 2
    }

    #[tokio::test]
    async fn auto_assign_without_free_resources_fails() {
        let world = fixtures::world().await;
        let first = pending_trip(&world).await;
        let second = pending_trip(&world).await;

        auto_assign(&world.store, world.tenant.id, first.id).await.unwrap();

        let err = auto_assign(&world.store, world.tenant.id, second.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable(_)));
    }
}
