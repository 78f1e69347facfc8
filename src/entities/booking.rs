use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// A ride request posted by a hotel or broker. Riders compete for it with
/// bids; confirming one bid assigns the rider until completion or rejection.
#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
pub struct Booking {
    #[polar(attribute)]
    pub id: Uuid,
    pub status: Status,
    #[polar(attribute)]
    pub creator_id: Uuid,
    pub pickup: Stop,
    pub destination: Stop,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub rider_amount: f64,
    pub commission: f64,
    pub total_amount: f64,
    pub number_of_guests: u32,
    pub vehicle_type: String,
    pub phone_number: String,
    #[polar(attribute)]
    pub rider_id: Option<Uuid>,
    pub confirmed_bid_id: Option<Uuid>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub started_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub city: String,
    pub area: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: String,
    pub rejected_at: DateTime<Utc>,
    pub rejected_by: Uuid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    BidPlaced,
    PendingConfirmation,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "pending".into(),
            Self::BidPlaced => "bid_placed".into(),
            Self::PendingConfirmation => "pending_confirmation".into(),
            Self::Confirmed => "confirmed".into(),
            Self::InProgress => "in_progress".into(),
            Self::Completed => "completed".into(),
            Self::Cancelled => "cancelled".into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Booking {
    pub fn new(
        creator_id: Uuid,
        pickup: Stop,
        destination: Stop,
        pickup_date: NaiveDate,
        pickup_time: NaiveTime,
        rider_amount: f64,
        commission: f64,
        number_of_guests: u32,
        vehicle_type: String,
        phone_number: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: Status::Pending,
            creator_id,
            pickup,
            destination,
            pickup_date,
            pickup_time,
            rider_amount,
            commission,
            total_amount: rider_amount + commission,
            number_of_guests,
            vehicle_type,
            phone_number,
            rider_id: None,
            confirmed_bid_id: None,
            rejection: None,
            created_at: now,
            started_at: None,
            started_by: None,
            completed_at: None,
            completed_by: None,
        }
    }

    pub fn accepts_bids(&self) -> bool {
        matches!(self.status, Status::Pending | Status::BidPlaced)
    }

    /// A rider placed or revised a bid.
    pub fn place_bid(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending | Status::BidPlaced => {
                self.status = Status::BidPlaced;
                Ok(())
            }
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    /// A rider direct-accepted the posted amount; the creator still has to
    /// confirm. A booking that already collected bids stays in `bid_placed`
    /// and the direct bid competes with the rest.
    pub fn request_confirmation(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::PendingConfirmation;
                Ok(())
            }
            Status::BidPlaced => Ok(()),
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    pub fn confirm(&mut self, rider_id: Uuid, bid_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::BidPlaced | Status::PendingConfirmation => {
                self.status = Status::Confirmed;
                self.rider_id = Some(rider_id);
                self.confirmed_bid_id = Some(bid_id);
                Ok(())
            }
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    /// The assigned rider backed out: reopen for another acceptance and
    /// return the bid that had been confirmed.
    pub fn reject(
        &mut self,
        actor: Uuid,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, Error> {
        match self.status {
            Status::Confirmed => {
                let confirmed_bid_id = self.confirmed_bid_id.take();

                self.status = Status::BidPlaced;
                self.rider_id = None;
                self.rejection = Some(Rejection {
                    reason,
                    rejected_at: now,
                    rejected_by: actor,
                });

                Ok(confirmed_bid_id)
            }
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    pub fn start(&mut self, actor: Uuid, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::Confirmed => {
                self.status = Status::InProgress;
                self.started_at = Some(now);
                self.started_by = Some(actor);
                Ok(())
            }
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    pub fn finish(&mut self, actor: Uuid, now: DateTime<Utc>) -> Result<(), Error> {
        match self.status {
            Status::InProgress => {
                self.status = Status::Completed;
                self.completed_at = Some(now);
                self.completed_by = Some(actor);
                Ok(())
            }
            _ => Err(Error::state_conflict_error(&self.status.name())),
        }
    }

    pub fn cancel(&mut self) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(Error::state_conflict_error(&self.status.name()));
        }

        self.status = Status::Cancelled;
        Ok(())
    }

    /// Admin override. Refuses targets that would leave a ride without an
    /// assigned rider.
    pub fn force_status(&mut self, status: Status) -> Result<(), Error> {
        let needs_rider = matches!(
            status,
            Status::Confirmed | Status::InProgress | Status::Completed
        );

        if needs_rider && self.rider_id.is_none() {
            return Err(Error::state_conflict_error(&self.status.name()));
        }

        self.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> Booking {
        Booking::new(
            Uuid::new_v4(),
            Stop {
                city: "Colombo".into(),
                area: Some("Fort".into()),
            },
            Stop {
                city: "Kandy".into(),
                area: None,
            },
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            4500.0,
            500.0,
            2,
            "sedan".into(),
            "0770000000".into(),
            Utc::now(),
        )
    }

    #[test]
    fn new_booking_totals_and_state() {
        let booking = booking();

        assert_eq!(booking.status, Status::Pending);
        assert_eq!(booking.total_amount, 5000.0);
        assert!(booking.accepts_bids());
        assert!(booking.rider_id.is_none() && booking.confirmed_bid_id.is_none());
    }

    #[test]
    fn full_lifecycle() {
        let mut booking = booking();
        let rider = Uuid::new_v4();
        let bid = Uuid::new_v4();
        let now = Utc::now();

        booking.place_bid().unwrap();
        assert_eq!(booking.status, Status::BidPlaced);

        booking.confirm(rider, bid).unwrap();
        assert_eq!(booking.status, Status::Confirmed);
        assert_eq!(booking.rider_id, Some(rider));
        assert_eq!(booking.confirmed_bid_id, Some(bid));

        booking.start(rider, now).unwrap();
        assert_eq!(booking.status, Status::InProgress);
        assert_eq!(booking.started_by, Some(rider));

        booking.finish(rider, now).unwrap();
        assert_eq!(booking.status, Status::Completed);
        assert_eq!(booking.completed_by, Some(rider));
    }

    #[test]
    fn rejection_reopens_and_clears_assignment() {
        let mut booking = booking();
        let rider = Uuid::new_v4();
        let bid = Uuid::new_v4();
        let now = Utc::now();

        booking.place_bid().unwrap();
        booking.confirm(rider, bid).unwrap();

        let released = booking
            .reject(rider, "car broke down".into(), now)
            .unwrap();

        assert_eq!(released, Some(bid));
        assert_eq!(booking.status, Status::BidPlaced);
        assert!(booking.rider_id.is_none());
        assert!(booking.confirmed_bid_id.is_none());

        let rejection = booking.rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, "car broke down");
        assert_eq!(rejection.rejected_by, rider);
    }

    #[test]
    fn start_and_finish_guard_source_states() {
        let mut booking = booking();
        let rider = Uuid::new_v4();
        let now = Utc::now();

        assert!(booking.start(rider, now).unwrap_err().is_state_conflict_error());
        assert!(booking.finish(rider, now).unwrap_err().is_state_conflict_error());

        booking.place_bid().unwrap();
        booking.confirm(rider, Uuid::new_v4()).unwrap();
        assert!(booking.finish(rider, now).is_err());
        booking.start(rider, now).unwrap();
        assert!(booking.start(rider, now).is_err());
    }

    #[test]
    fn direct_accept_transitions() {
        let mut booking = booking();
        booking.request_confirmation().unwrap();
        assert_eq!(booking.status, Status::PendingConfirmation);

        // With prior bids the booking stays open for the creator's pick.
        let mut busy = self::booking();
        busy.place_bid().unwrap();
        busy.request_confirmation().unwrap();
        assert_eq!(busy.status, Status::BidPlaced);

        booking
            .confirm(Uuid::new_v4(), Uuid::new_v4())
            .unwrap();
        assert_eq!(booking.status, Status::Confirmed);
    }

    #[test]
    fn cancel_from_any_non_terminal_state_only() {
        let mut booking = booking();
        booking.cancel().unwrap();
        assert_eq!(booking.status, Status::Cancelled);
        assert!(booking.cancel().is_err());

        let mut done = self::booking();
        let rider = Uuid::new_v4();
        done.place_bid().unwrap();
        done.confirm(rider, Uuid::new_v4()).unwrap();
        done.start(rider, Utc::now()).unwrap();
        done.finish(rider, Utc::now()).unwrap();
        assert!(done.cancel().is_err());
    }

    #[test]
    fn force_status_refuses_riderless_rides() {
        let mut booking = booking();

        assert!(booking.force_status(Status::Confirmed).is_err());

        booking.place_bid().unwrap();
        booking.confirm(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        booking.force_status(Status::Completed).unwrap();
        assert_eq!(booking.status, Status::Completed);
    }

    #[test]
    fn double_confirm_is_rejected() {
        let mut booking = booking();
        booking.place_bid().unwrap();
        booking.confirm(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        assert!(booking
            .confirm(Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err()
            .is_state_conflict_error());
    }
}
