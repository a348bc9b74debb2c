use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::GeoPoint;

/// Company/brand namespace. Every other entity is scoped to one tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    /// Percentage applied over base prices for corporate customers.
    pub markup_percent: Option<f64>,
    /// Fallback origin for location feeds and center of the pickup area.
    pub center: GeoPoint,
    pub service_radius_km: f64,
    /// Flag-fall for ad-hoc trips (parcel, point-to-point, airport transfer).
    pub base_fare: f64,
    pub per_km_rate: f64,
}
