use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::PaymentMethod;

/// Issued exactly once, when a booking completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub issued_at: DateTime<Utc>,
}
