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
    api::{BidAPI, BidReceipt},
    auth::User,
    entities::{Bid, Booking},
    error::Error,
    notify::Event,
};

#[async_trait]
impl BidAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn submit_bid(
        &self,
        user: User,
        booking_id: Uuid,
        amount: f64,
        vehicle: String,
    ) -> Result<BidReceipt, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::validation_error("bid amount must be a positive number"));
        }

        if vehicle.trim().is_empty() {
            return Err(Error::validation_error("a vehicle must be selected"));
        }

        let now = self.now();
        let today = self.service_day(now);

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &booking_id).await?;

        self.authorize(user.clone(), "submit_bid", booking.clone())?;

        if !booking.accepts_bids() {
            return Err(Error::state_conflict_error(&booking.status.name()));
        }

        let commission = fetch_app_commission(&mut tx).await?;

        let mut limit = fetch_ride_limit_for_update(&mut tx, self.limits.daily_limit, today).await?;
        limit.roll_over(today);

        let bid = match fetch_rider_bid_for_update(&mut tx, &booking_id, &user.id).await? {
            Some(mut bid) => {
                // Revision overwrites the existing record; the quota was
                // already consumed when the bid was first placed.
                bid.revise(amount, commission, vehicle)?;
                update_bid(&mut tx, &bid).await?;
                bid
            }
            None => {
                let eligibility = limit.can_take_ride_action(&user.id, today);

                if !eligibility.can_take_action {
                    return Err(Error::quota_exceeded_error(
                        eligibility.remaining_rides,
                        limit.daily_limit,
                    ));
                }

                let bid = Bid::new(booking_id, user.id, amount, commission, vehicle, now);
                insert_bid(&mut tx, &bid).await?;
                limit.increment_ride_count(user.id, today);
                bid
            }
        };

        booking.place_bid()?;

        update_ride_limit(&mut tx, &limit).await?;
        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        let remaining_rides = limit.remaining_rides(&user.id, today);

        self.publish(Event::BidPlaced {
            booking,
            bid: bid.clone(),
        });

        Ok(BidReceipt {
            bid,
            remaining_rides,
            daily_limit: limit.daily_limit,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn accept_bid(&self, user: User, bid_id: Uuid, booking_id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut booking = fetch_booking_for_update(&mut tx, &booking_id).await?;

        self.authorize(user.clone(), "accept_bid", booking.clone())?;

        let mut bid = fetch_bid_for_update(&mut tx, &bid_id).await?;

        if bid.booking_id != booking.id {
            return Err(Error::validation_error("bid does not belong to this booking"));
        }

        bid.accept()?;
        booking.confirm(bid.rider_id, bid.id)?;

        // Losing bids are resolved in one statement, atomically with the
        // booking's status flip.
        tx.execute(
            sqlx::query(
                "UPDATE bids SET status = 'rejected', data = jsonb_set(data, '{status}', '\"rejected\"') WHERE booking_id = $1 AND id <> $2 AND status <> 'rejected'",
            )
            .bind(&booking.id)
            .bind(&bid.id),
        )
        .await?;

        update_bid(&mut tx, &bid).await?;
        update_booking(&mut tx, &booking).await?;

        tx.commit().await?;

        self.publish(Event::BidAccepted { booking, bid });

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids(&self, user: User, booking_id: Uuid) -> Result<Vec<Bid>, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(booking): Json<Booking> = conn
            .fetch_optional(
                sqlx::query("SELECT data FROM bookings WHERE id = $1").bind(&booking_id),
            )
            .await?
            .ok_or_else(|| Error::not_found_error("booking"))?
            .try_get("data")?;

        self.authorize(user.clone(), "read", booking.clone())?;

        // creators and operators see the whole field; riders see their own
        let sees_all = user.id == booking.creator_id
            || user.has_role("admin".into())
            || user.has_role("system".into());

        let query = if sees_all {
            sqlx::query("SELECT data FROM bids WHERE booking_id = $1").bind(&booking_id)
        } else {
            sqlx::query("SELECT data FROM bids WHERE booking_id = $1 AND rider_id = $2")
                .bind(&booking_id)
                .bind(&user.id)
        };

        let rows = conn.fetch_all(query).await?;

        let mut bids = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Json(bid): Json<Bid> = row.try_get("data")?;
            bids.push(bid);
        }

        Ok(bids)
    }
}
