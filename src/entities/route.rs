use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    ScheduledSeat,
    Private,
    Parcel,
    PointToPoint,
    AirportTransfer,
}

/// A bookable service. Scheduled-seat routes carry a finite seat inventory;
/// the other kinds are per-trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub kind: ServiceKind,
    pub base_price: f64,
    pub child_price: Option<f64>,
    /// Remaining seats, scheduled-seat kind only.
    pub seats_available: Option<u32>,
    /// Flat surcharge per operating tenant, added on top of the base price.
    #[serde(default)]
    pub surcharges: HashMap<Uuid, f64>,
}
