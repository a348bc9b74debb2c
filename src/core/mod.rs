pub mod booking;
pub mod dispatch;
pub mod feed;
pub mod lifecycle;
pub mod notify;
pub mod pricing;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::entities::driver::{Driver, DriverStatus};
    use crate::entities::location::GeoPoint;
    use crate::entities::route::{Route, ServiceKind};
    use crate::entities::tenant::Tenant;
    use crate::entities::user::{User, UserRole};
    use crate::entities::vehicle::{Vehicle, VehicleKind, VehicleStatus};
    use crate::store::Store;

    pub const CENTER: GeoPoint = GeoPoint {
        lat: -6.2088,
        lng: 106.8456,
    };

    pub struct World {
        pub store: Arc<Store>,
        pub tenant: Tenant,
        pub customer: User,
        pub driver: Driver,
        pub vehicle: Vehicle,
    }

    /// One tenant with a free driver, an available four-seat sedan and a
    /// registered customer.
    pub async fn world() -> World {
        let store = Arc::new(Store::new());

        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: "metro-cars".to_string(),
            markup_percent: Some(20.0),
            center: CENTER,
            service_radius_km: 30.0,
            base_fare: 2.5,
            per_km_rate: 1.2,
        };
        store.tenants.put(tenant.clone()).await;

        let customer = User {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            email: "rider@example.com".to_string(),
            password_hash: String::new(),
            name: "Rider".to_string(),
            phone: None,
            role: UserRole::Customer,
            created_at: Utc::now(),
        };
        store.users.put(customer.clone()).await;

        let driver = driver_profile(tenant.id, Uuid::from_u128(1));
        store.drivers.put(driver.clone()).await;

        let vehicle = sedan(tenant.id, Uuid::from_u128(1), 4);
        store.vehicles.put(vehicle.clone()).await;

        World {
            store,
            tenant,
            customer,
            driver,
            vehicle,
        }
    }

    pub fn driver_profile(tenant_id: Uuid, id: Uuid) -> Driver {
        Driver {
            id,
            tenant_id,
            user_id: Uuid::new_v4(),
            name: format!("driver-{id}"),
            license_number: "B 1234 XY".to_string(),
            status: DriverStatus::Free,
            vehicle_id: None,
        }
    }

    pub fn sedan(tenant_id: Uuid, id: Uuid, capacity: u32) -> Vehicle {
        Vehicle {
            id,
            tenant_id,
            registration: format!("REG-{capacity}"),
            kind: VehicleKind::Sedan,
            capacity,
            status: VehicleStatus::Available,
        }
    }

    pub fn scheduled_route(tenant_id: Uuid, seats: u32) -> Route {
        Route {
            id: Uuid::new_v4(),
            tenant_id,
            name: "airport shuttle".to_string(),
            kind: ServiceKind::ScheduledSeat,
            base_price: 10.0,
            child_price: Some(6.0),
            seats_available: Some(seats),
            surcharges: Default::default(),
        }
    }
}
