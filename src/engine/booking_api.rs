use super::helpers::{
    fetch_app_commission, fetch_bid_for_update, fetch_booking_for_update,
    fetch_ride_limit_for_update, fetch_rider_bid_for_update, insert_bid, update_bid,
    update_booking, update_ride_limit,
};
use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{BookingAPI, BookingDraft, DeletionSummary},
    auth::{Platform, User},
    entities::{Bid, Booking, BookingStatus, DeletedBooking, RestoredRider},
    error::Error,
    notify::Event,
};

#[async_trait]
impl BookingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_booking(&self, user: User, draft: BookingDraft) -> Result<Booking, Error> {
        self.authorize(user.clone(), "create_booking", Platform::default())?;

        if !draft.rider_amount.is_finite() || draft.rider_amount < 0.0 {
            return Err(Error::validation_error(
                "rider amount must be a non-negative number",
            ));
        }

        if !draft.commission.is_finite() || draft.commission < 0.0 {
            return Err(Error::validation_error(
                "commission must be a non-negative number",
            ));
        }

        if draft.number_of_guests == 0 {
            return Err(Error::validation_error("at least one guest is required"));
        }

        if draft.vehicle_type.trim().is_empty() {
            return Err(Error::validation_error("a vehicle type is required"));
        }

        if draft.phone_number.trim().is_empty() {
            return Err(Error::validation_error("a phone number is required"));
        }

        let booking = Booking::new(
            user.id,
            draft.pickup,
            draft.destination,
            draft.pickup_date,
            draft.pickup_time,
            draft.rider_amount,
            draft.commission,
            draft.number_of_guests,
            draft.vehicle_type,
            draft.phone_number,
            self.now(),
        );

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("INSERT INTO bookings (id, status, data) VALUES ($1, $2, $3)")
                .bind(&booking.id)
                .bind(booking.status.name())
                .bind(Json(&booking)),
        )
        .await?;

        self.publish(Event::BookingCreated {
            booking: booking.clone(),
        });

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(booking): Json<Booking> = conn
            .fetch_optional(sqlx::query("SELECT data FROM bookings WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(|| Error::not_found_error("booking"))?
            .try_get("data")?;

        self.authorize(user.clone(), "read", booking.clone())?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_booking(
        &self,
        user: User,
        id: Uuid,
        vehicle: String,
    ) -> Result<Booking, Error> {
        if vehicle.trim().is_empty() {
            return Err(Error::validation_error("a vehicle must be selected"));
        }

        let now = self.now();
        let today = self.service_day(now);

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "accept_booking", booking.clone())?;

        if fetch_rider_bid_for_update(&mut tx, &id, &user.id)
            .await?
            .is_some()
        {
            return Err(Error::validation_error(
                "you already have a bid for this booking",
            ));
        }

        booking.request_confirmation()?;

        let commission = fetch_app_commission(&mut tx).await?;

        let mut limit = fetch_ride_limit_for_update(&mut tx, self.limits.daily_limit, today).await?;
        limit.roll_over(today);

        let eligibility = limit.can_take_ride_action(&user.id, today);

        if !eligibility.can_take_action {
            return Err(Error::quota_exceeded_error(
                eligibility.remaining_rides,
                limit.daily_limit,
            ));
        }

        let bid = Bid::direct(
            booking.id,
            user.id,
            booking.total_amount,
            commission,
            vehicle,
            now,
        );

        insert_bid(&mut tx, &bid).await?;
        limit.increment_ride_count(user.id, today);

        update_ride_limit(&mut tx, &limit).await?;
        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        self.publish(Event::BookingAccepted {
            booking: booking.clone(),
            bid,
        });

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn reject_ride(&self, user: User, id: Uuid, reason: String) -> Result<Booking, Error> {
        let reason = reason.trim().to_string();

        if reason.is_empty() {
            return Err(Error::validation_error("a rejection reason is required"));
        }

        let now = self.now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "reject_ride", booking.clone())?;

        let released_bid = booking.reject(user.id, reason.clone(), now)?;

        if let Some(bid_id) = released_bid {
            match fetch_bid_for_update(&mut tx, &bid_id).await {
                Ok(mut bid) => {
                    bid.reject(Some(reason.clone()))?;
                    update_bid(&mut tx, &bid).await?;
                }
                Err(err) if err.is_not_found_error() => {}
                Err(err) => return Err(err),
            }
        }

        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        self.publish(Event::RideRejected {
            booking: booking.clone(),
            reason,
            rider_id: user.id,
        });

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn start_ride(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let now = self.now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "start_ride", booking.clone())?;

        booking.start(user.id, now)?;

        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        self.publish(Event::RideStarted {
            booking: booking.clone(),
        });

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn finish_ride(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let now = self.now();

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "finish_ride", booking.clone())?;

        booking.finish(user.id, now)?;

        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        self.publish(Event::RideCompleted {
            booking: booking.clone(),
        });

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "cancel", booking.clone())?;

        booking.cancel()?;

        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        self.publish(Event::BookingCancelled {
            booking: booking.clone(),
        });

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn set_booking_status(
        &self,
        user: User,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "set_status", booking.clone())?;

        booking.force_status(status)?;

        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_booking(
        &self,
        user: User,
        id: Uuid,
        reason: String,
    ) -> Result<DeletionSummary, Error> {
        let reason = reason.trim().to_string();

        if reason.is_empty() {
            return Err(Error::validation_error("a deletion reason is required"));
        }

        let now = self.now();
        let today = self.service_day(now);

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let booking = fetch_booking_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "delete", booking.clone())?;

        let rows = tx
            .fetch_all(
                sqlx::query("SELECT data FROM bids WHERE booking_id = $1 FOR UPDATE").bind(&id),
            )
            .await?;

        let mut bids = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Json(bid): Json<Bid> = row.try_get("data")?;
            bids.push(bid);
        }

        let mut limit = fetch_ride_limit_for_update(&mut tx, self.limits.daily_limit, today).await?;
        limit.roll_over(today);

        // One unit per bid record, never below zero.
        let mut restored_riders = Vec::new();
        for bid in bids.iter() {
            if let Some((previous_count, new_count)) = limit.restore_ride_count(&bid.rider_id, 1) {
                restored_riders.push(RestoredRider {
                    rider_id: bid.rider_id,
                    previous_count,
                    new_count,
                });
            }
        }

        update_ride_limit(&mut tx, &limit).await?;

        let tombstone = DeletedBooking::new(
            booking.clone(),
            bids.clone(),
            user.clone(),
            reason,
            restored_riders.clone(),
            now,
        );

        tx.execute(
            sqlx::query(
                "INSERT INTO deleted_bookings (id, booking_id, deleted_at, data) VALUES ($1, $2, $3, $4)",
            )
            .bind(&tombstone.id)
            .bind(&booking.id)
            .bind(&tombstone.deleted_at)
            .bind(Json(&tombstone)),
        )
        .await?;

        tx.execute(sqlx::query("DELETE FROM bids WHERE booking_id = $1").bind(&booking.id))
            .await?;
        tx.execute(sqlx::query("DELETE FROM bookings WHERE id = $1").bind(&booking.id))
            .await?;

        tx.commit().await?;

        self.publish(Event::BookingDeleted {
            booking_id: booking.id,
            deleted_by: user.id,
            reason: tombstone.reason.clone(),
        });

        Ok(DeletionSummary {
            booking_id: booking.id,
            deleted_bids: bids.len() as u32,
            restored_riders,
        })
    }
}
