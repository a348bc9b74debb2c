use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::entities::booking::Booking;
use crate::entities::driver::Driver;
use crate::entities::invoice::Invoice;
use crate::entities::location::LocationSample;
use crate::entities::route::Route;
use crate::entities::tenant::Tenant;
use crate::entities::user::User;
use crate::entities::vehicle::Vehicle;
use crate::error::{AppError, AppResult};

/// Anything the store can hold: identified, tenant-scoped, cheap to clone.
pub trait Stored: Clone + Send + Sync + 'static {
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn tenant_id(&self) -> Uuid;
}

macro_rules! stored {
    ($ty:ty, $kind:literal, $id:ident, $tenant:ident) => {
        impl Stored for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Uuid {
                self.$id
            }

            fn tenant_id(&self) -> Uuid {
                self.$tenant
            }
        }
    };
}

stored!(Tenant, "tenant", id, id);
stored!(User, "user", id, tenant_id);
stored!(Route, "route", id, tenant_id);
stored!(Booking, "booking", id, tenant_id);
stored!(Driver, "driver", id, tenant_id);
stored!(Vehicle, "vehicle", id, tenant_id);
// Samples are keyed by booking id: one live sample per trip.
stored!(LocationSample, "location sample", booking_id, tenant_id);
stored!(Invoice, "invoice", id, tenant_id);

/// One typed table. Writes are whole-entity replacements; callers
/// read-modify-write.
pub struct Repository<T: Stored> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Stored> Repository<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Point lookup. Fails with `NotFound` when the id is absent or the row
    /// belongs to another tenant.
    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> AppResult<T> {
        self.rows
            .read()
            .await
            .get(&id)
            .filter(|row| row.tenant_id() == tenant_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::KIND, id)))
    }

    /// Filtered listing within a tenant. Returns an empty vec, never an error.
    pub async fn list<F>(&self, tenant_id: Uuid, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| row.tenant_id() == tenant_id && predicate(row))
            .cloned()
            .collect()
    }

    /// Cross-tenant scan for internal lookups (login by email and the like).
    pub async fn find<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows.read().await.values().find(|row| predicate(row)).cloned()
    }

    pub async fn put(&self, row: T) {
        self.rows.write().await.insert(row.id(), row);
    }

    pub async fn remove(&self, id: Uuid) -> Option<T> {
        self.rows.write().await.remove(&id)
    }

    /// Raw read guard, for multi-row reads that must be consistent.
    pub async fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, T>> {
        self.rows.read().await
    }

    /// Raw write guard. Check-then-act sequences hold this across the whole
    /// sequence; see the lock-order note on [`Store`].
    pub async fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, T>> {
        self.rows.write().await
    }
}

/// The authoritative in-memory store, one table per entity kind.
///
/// Critical sections spanning several tables must acquire the locks in
/// declaration order (tenants, users, routes, bookings, drivers, vehicles,
/// samples, invoices) so they cannot deadlock each other.
pub struct Store {
    pub tenants: Repository<Tenant>,
    pub users: Repository<User>,
    pub routes: Repository<Route>,
    pub bookings: Repository<Booking>,
    pub drivers: Repository<Driver>,
    pub vehicles: Repository<Vehicle>,
    pub samples: Repository<LocationSample>,
    pub invoices: Repository<Invoice>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            tenants: Repository::new(),
            users: Repository::new(),
            routes: Repository::new(),
            bookings: Repository::new(),
            drivers: Repository::new(),
            vehicles: Repository::new(),
            samples: Repository::new(),
            invoices: Repository::new(),
        }
    }

    pub async fn tenant(&self, tenant_id: Uuid) -> AppResult<Tenant> {
        self.tenants.get(tenant_id, tenant_id).await
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::location::GeoPoint;

    fn tenant(name: &str) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            markup_percent: None,
            center: GeoPoint { lat: 0.0, lng: 0.0 },
            service_radius_km: 25.0,
            base_fare: 2.5,
            per_km_rate: 1.0,
        }
    }

    #[tokio::test]
    async fn point_lookup_is_tenant_scoped() {
        let store = Store::new();
        let a = tenant("a");
        let b = tenant("b");
        store.tenants.put(a.clone()).await;
        store.tenants.put(b.clone()).await;

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            tenant_id: a.id,
            registration: "AB-123".to_string(),
            kind: crate::entities::vehicle::VehicleKind::Sedan,
            capacity: 4,
            status: crate::entities::vehicle::VehicleStatus::Available,
        };
        store.vehicles.put(vehicle.clone()).await;

        assert!(store.vehicles.get(a.id, vehicle.id).await.is_ok());
        // The same id through another tenant's scope is invisible.
        assert!(matches!(
            store.vehicles.get(b.id, vehicle.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_returns_empty_not_error() {
        let store = Store::new();
        let rows = store.bookings.list(Uuid::new_v4(), |_| true).await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn put_replaces_whole_entity() {
        let store = Store::new();
        let mut t = tenant("a");
        store.tenants.put(t.clone()).await;
        t.markup_percent = Some(15.0);
        store.tenants.put(t.clone()).await;

        let read = store.tenant(t.id).await.unwrap();
        assert_eq!(read.markup_percent, Some(15.0));
    }
}
