use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Bid, Booking};

/// Immutable audit record written when a booking is deleted: the full
/// booking and bid snapshots, who deleted it and why, and which riders got
/// quota handed back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeletedBooking {
    pub id: Uuid,
    pub booking: Booking,
    pub bids: Vec<Bid>,
    pub deleted_by: User,
    pub reason: String,
    pub deleted_at: DateTime<Utc>,
    pub restored_riders: Vec<RestoredRider>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestoredRider {
    pub rider_id: Uuid,
    pub previous_count: u32,
    pub new_count: u32,
}

impl DeletedBooking {
    pub fn new(
        booking: Booking,
        bids: Vec<Bid>,
        deleted_by: User,
        reason: String,
        restored_riders: Vec<RestoredRider>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking,
            bids,
            deleted_by,
            reason,
            deleted_at: now,
            restored_riders,
        }
    }
}
