use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Commission;
use crate::error::Error;

/// A rider's offer against a booking. At most one bid exists per
/// (booking, rider) pair; re-submission revises the record in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub rider_id: Uuid,
    pub status: Status,
    pub amount: f64,
    pub commission: Commission,
    pub rider_income: f64,
    pub vehicle: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    PendingConfirmation,
    Accepted,
    Rejected,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "pending".into(),
            Self::PendingConfirmation => "pending_confirmation".into(),
            Self::Accepted => "accepted".into(),
            Self::Rejected => "rejected".into(),
        }
    }
}

impl Bid {
    pub fn new(
        booking_id: Uuid,
        rider_id: Uuid,
        amount: f64,
        commission: Commission,
        vehicle: String,
        now: DateTime<Utc>,
    ) -> Self {
        let rider_income = commission.rider_income(amount);

        Self {
            id: Uuid::new_v4(),
            booking_id,
            rider_id,
            status: Status::Pending,
            amount,
            commission,
            rider_income,
            vehicle,
            rejection_reason: None,
            created_at: now,
        }
    }

    /// A direct acceptance of the booking at its posted amount, awaiting the
    /// creator's confirmation.
    pub fn direct(
        booking_id: Uuid,
        rider_id: Uuid,
        amount: f64,
        commission: Commission,
        vehicle: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut bid = Self::new(booking_id, rider_id, amount, commission, vehicle, now);
        bid.status = Status::PendingConfirmation;

        bid
    }

    /// Re-submission by the same rider: overwrite the amount and vehicle and
    /// take a fresh commission snapshot, keeping the record's identity.
    pub fn revise(
        &mut self,
        amount: f64,
        commission: Commission,
        vehicle: String,
    ) -> Result<(), Error> {
        match self.status {
            Status::Pending | Status::PendingConfirmation | Status::Rejected => {
                self.rider_income = commission.rider_income(amount);
                self.amount = amount;
                self.commission = commission;
                self.vehicle = vehicle;
                self.status = Status::Pending;
                self.rejection_reason = None;

                Ok(())
            }
            Status::Accepted => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    pub fn accept(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending | Status::PendingConfirmation => {
                self.status = Status::Accepted;
                Ok(())
            }
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    pub fn reject(&mut self, reason: Option<String>) -> Result<(), Error> {
        match self.status {
            Status::Rejected => Err(Error::state_conflict_error(&self.status.name())),
            _ => {
                self.status = Status::Rejected;
                self.rejection_reason = reason;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commission() -> Commission {
        Commission::Percentage { value: 10.0 }
    }

    fn bid() -> Bid {
        Bid::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1000.0,
            commission(),
            "sedan".into(),
            Utc::now(),
        )
    }

    #[test]
    fn new_bid_snapshots_income() {
        let bid = bid();

        assert_eq!(bid.status, Status::Pending);
        assert_eq!(bid.rider_income, 900.0);
    }

    #[test]
    fn revise_keeps_identity_and_resnapshots() {
        let mut bid = bid();
        let id = bid.id;

        bid.revise(1200.0, Commission::Fixed { value: 50.0 }, "van".into())
            .unwrap();

        assert_eq!(bid.id, id);
        assert_eq!(bid.amount, 1200.0);
        assert_eq!(bid.rider_income, 1150.0);
        assert_eq!(bid.vehicle, "van");
    }

    #[test]
    fn accepted_bid_cannot_be_revised_or_reaccepted() {
        let mut bid = bid();

        bid.accept().unwrap();
        assert_eq!(bid.status, Status::Accepted);

        assert!(bid.accept().is_err());
        assert!(bid
            .revise(900.0, commission(), "sedan".into())
            .unwrap_err()
            .is_state_conflict_error());
    }

    #[test]
    fn reject_records_reason_once() {
        let mut bid = bid();

        bid.accept().unwrap();
        bid.reject(Some("car broke down".into())).unwrap();

        assert_eq!(bid.status, Status::Rejected);
        assert_eq!(bid.rejection_reason.as_deref(), Some("car broke down"));
        assert!(bid.reject(None).is_err());
    }

    #[test]
    fn direct_bid_awaits_confirmation() {
        let bid = Bid::direct(
            Uuid::new_v4(),
            Uuid::new_v4(),
            2000.0,
            Commission::Fixed { value: 150.0 },
            "sedan".into(),
            Utc::now(),
        );

        assert_eq!(bid.status, Status::PendingConfirmation);
        assert_eq!(bid.rider_income, 1850.0);
    }
}
