use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverStatus {
    Free,
    /// Bound to a confirmed booking, not yet driving.
    Busy,
    OnTrip,
}

/// Dispatchable driver profile, linked to a driver-role user account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub license_number: String,
    pub status: DriverStatus,
    /// Held only while Busy or OnTrip.
    pub vehicle_id: Option<Uuid>,
}
