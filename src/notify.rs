use async_channel::Receiver;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{Bid, Booking};
use crate::error::Error;

/// A fact the engine publishes after its transaction commits. Dispatch is
/// fire-and-forget: nothing downstream of the channel can fail a core
/// operation.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    BookingCreated { booking: Booking },
    BidPlaced { booking: Booking, bid: Bid },
    BookingAccepted { booking: Booking, bid: Bid },
    BidAccepted { booking: Booking, bid: Bid },
    RideRejected { booking: Booking, reason: String, rider_id: Uuid },
    RideStarted { booking: Booking },
    RideCompleted { booking: Booking },
    BookingCancelled { booking: Booking },
    BookingDeleted { booking_id: Uuid, deleted_by: Uuid, reason: String },
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub recipients: Vec<Uuid>,
    pub title: String,
    pub body: String,
    pub data: Value,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BookingCreated { .. } => "booking_created",
            Self::BidPlaced { .. } => "bid_placed",
            Self::BookingAccepted { .. } => "booking_accepted",
            Self::BidAccepted { .. } => "bid_accepted",
            Self::RideRejected { .. } => "ride_rejected",
            Self::RideStarted { .. } => "ride_started",
            Self::RideCompleted { .. } => "ride_completed",
            Self::BookingCancelled { .. } => "booking_cancelled",
            Self::BookingDeleted { .. } => "booking_deleted",
        }
    }

    /// Renders the push notification for this event, if it warrants one.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::BidPlaced { booking, bid } => Some(Notification {
                recipients: vec![booking.creator_id],
                title: "New Bid Received".into(),
                body: format!(
                    "A rider has placed a bid of Rs. {:.2} for your booking from {} to {}.",
                    bid.amount, booking.pickup.city, booking.destination.city
                ),
                data: json!({
                    "booking_id": booking.id,
                    "bid_id": bid.id,
                    "amount": bid.amount,
                    "kind": "new_bid",
                }),
            }),
            Self::BookingAccepted { booking, bid } => Some(Notification {
                recipients: vec![booking.creator_id],
                title: "Booking Accepted".into(),
                body: format!(
                    "A rider has accepted your booking from {} to {} for Rs. {:.2}.",
                    booking.pickup.city, booking.destination.city, booking.total_amount
                ),
                data: json!({
                    "booking_id": booking.id,
                    "bid_id": bid.id,
                    "kind": "booking_accepted",
                }),
            }),
            Self::BidAccepted { booking, bid } => Some(Notification {
                recipients: vec![bid.rider_id],
                title: "Ride Confirmed".into(),
                body: format!(
                    "Your ride from {} to {} has been confirmed.",
                    booking.pickup.city, booking.destination.city
                ),
                data: json!({
                    "booking_id": booking.id,
                    "bid_id": bid.id,
                    "kind": "ride_confirmation",
                }),
            }),
            Self::RideRejected {
                booking,
                reason,
                rider_id,
            } => Some(Notification {
                recipients: vec![booking.creator_id],
                title: "Ride Rejected".into(),
                body: format!(
                    "Your ride from {} to {} has been rejected by the rider. Reason: {}",
                    booking.pickup.city, booking.destination.city, reason
                ),
                data: json!({
                    "booking_id": booking.id,
                    "rider_id": rider_id,
                    "reason": reason,
                    "kind": "ride_rejected",
                }),
            }),
            Self::RideStarted { booking } => Some(Notification {
                recipients: vec![booking.creator_id],
                title: "Ride Started".into(),
                body: format!(
                    "Your ride from {} to {} has been started.",
                    booking.pickup.city, booking.destination.city
                ),
                data: json!({
                    "booking_id": booking.id,
                    "kind": "ride_started",
                }),
            }),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipients: &[Uuid],
        title: &str,
        body: &str,
        data: Value,
    ) -> Result<u32, Error>;
}

/// Log-only delivery, used when no push gateway is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipients: &[Uuid],
        title: &str,
        _body: &str,
        _data: Value,
    ) -> Result<u32, Error> {
        tracing::info!(?recipients, title, "notification (log only)");

        Ok(recipients.len() as u32)
    }
}

/// Out-of-scope earnings/commission read models, recomputed when a ride
/// completes.
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn recompute_on_completion(&self, booking: &Booking) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct LogSummaryService;

#[async_trait]
impl SummaryService for LogSummaryService {
    async fn recompute_on_completion(&self, booking: &Booking) -> Result<(), Error> {
        tracing::info!(
            booking_id = %booking.id,
            "earnings and commission summaries due for recompute"
        );

        Ok(())
    }
}

/// Drains the engine's event channel. Every failure is logged and swallowed;
/// the operations that produced these events have already committed.
pub async fn dispatch(
    inbox: Receiver<Event>,
    notifier: Arc<dyn Notifier>,
    summaries: Arc<dyn SummaryService>,
) {
    while let Ok(event) = inbox.recv().await {
        tracing::info!(event = event.name(), "dispatching event");

        if let Event::RideCompleted { booking } = &event {
            if let Err(err) = summaries.recompute_on_completion(booking).await {
                tracing::warn!(?err, "summary recompute failed");
            }
        }

        if let Some(notification) = event.notification() {
            match notifier
                .notify(
                    &notification.recipients,
                    &notification.title,
                    &notification.body,
                    notification.data.clone(),
                )
                .await
            {
                Ok(sent_count) => tracing::debug!(sent_count, "notification dispatched"),
                Err(err) => tracing::warn!(?err, "notification dispatch failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Commission, Stop};
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn booking() -> Booking {
        Booking::new(
            Uuid::new_v4(),
            Stop {
                city: "Colombo".into(),
                area: None,
            },
            Stop {
                city: "Kandy".into(),
                area: None,
            },
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            4500.0,
            500.0,
            2,
            "sedan".into(),
            "0770000000".into(),
            Utc::now(),
        )
    }

    fn bid(booking: &Booking) -> Bid {
        Bid::new(
            booking.id,
            Uuid::new_v4(),
            1000.0,
            Commission::Percentage { value: 10.0 },
            "sedan".into(),
            Utc::now(),
        )
    }

    #[test]
    fn bid_placed_notifies_the_creator() {
        let booking = booking();
        let bid = bid(&booking);

        let notification = Event::BidPlaced {
            booking: booking.clone(),
            bid,
        }
        .notification()
        .unwrap();

        assert_eq!(notification.recipients, vec![booking.creator_id]);
        assert!(notification.body.contains("Colombo"));
        assert!(notification.body.contains("1000.00"));
    }

    #[test]
    fn bid_accepted_notifies_the_rider() {
        let booking = booking();
        let bid = bid(&booking);
        let rider = bid.rider_id;

        let notification = Event::BidAccepted { booking, bid }.notification().unwrap();

        assert_eq!(notification.recipients, vec![rider]);
        assert_eq!(notification.title, "Ride Confirmed");
    }

    #[test]
    fn lifecycle_events_without_notifications() {
        let booking = booking();

        assert!(Event::BookingCreated {
            booking: booking.clone()
        }
        .notification()
        .is_none());
        assert!(Event::RideCompleted {
            booking: booking.clone()
        }
        .notification()
        .is_none());
        assert!(Event::BookingCancelled { booking }.notification().is_none());
    }
}
