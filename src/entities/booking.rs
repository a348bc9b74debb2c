use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    /// Driver and vehicle bound by the dispatcher.
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Account,
}

/// Per-kind booking payload. One variant per service kind, each with its
/// own strongly-typed details.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BookingDetails {
    ScheduledSeat {
        adults: u32,
        children: u32,
        pickup: GeoPoint,
    },
    Private {
        passengers: u32,
        pickup: GeoPoint,
        dropoff: GeoPoint,
    },
    Parcel {
        description: String,
        weight_kg: f64,
        pickup_address: String,
        dropoff_address: String,
        pickup: Option<GeoPoint>,
        dropoff: Option<GeoPoint>,
    },
    PointToPoint {
        passengers: u32,
        pickup: GeoPoint,
        dropoff: GeoPoint,
    },
    AirportTransfer {
        flight_number: String,
        passengers: u32,
        pickup: GeoPoint,
        dropoff: GeoPoint,
    },
}

impl BookingDetails {
    /// Seats the trip occupies; one for a parcel.
    pub fn seats(&self) -> u32 {
        match self {
            BookingDetails::ScheduledSeat { adults, children, .. } => adults + children,
            BookingDetails::Private { passengers, .. }
            | BookingDetails::PointToPoint { passengers, .. }
            | BookingDetails::AirportTransfer { passengers, .. } => *passengers,
            BookingDetails::Parcel { .. } => 1,
        }
    }

    pub fn pickup_point(&self) -> Option<GeoPoint> {
        match self {
            BookingDetails::ScheduledSeat { pickup, .. }
            | BookingDetails::Private { pickup, .. }
            | BookingDetails::PointToPoint { pickup, .. }
            | BookingDetails::AirportTransfer { pickup, .. } => Some(*pickup),
            BookingDetails::Parcel { pickup, .. } => *pickup,
        }
    }

    pub fn dropoff_point(&self) -> Option<GeoPoint> {
        match self {
            BookingDetails::ScheduledSeat { .. } => None,
            BookingDetails::Private { dropoff, .. }
            | BookingDetails::PointToPoint { dropoff, .. }
            | BookingDetails::AirportTransfer { dropoff, .. } => Some(*dropoff),
            BookingDetails::Parcel { dropoff, .. } => *dropoff,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    /// Absent for ad-hoc kinds booked without a published route.
    pub route_id: Option<Uuid>,
    pub status: BookingStatus,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub details: BookingDetails,
    pub price: f64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
