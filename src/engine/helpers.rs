use super::Database;

use chrono::NaiveDate;
use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    entities::{Bid, Booking, Commission, RideLimit},
    error::Error,
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_booking_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Booking, Error> {
    let Json(booking): Json<Booking> = tx
        .fetch_optional(sqlx::query("SELECT data FROM bookings WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| Error::not_found_error("booking"))?
        .try_get("data")?;

    Ok(booking)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_bid_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Bid, Error> {
    let Json(bid): Json<Bid> = tx
        .fetch_optional(sqlx::query("SELECT data FROM bids WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| Error::not_found_error("bid"))?
        .try_get("data")?;

    Ok(bid)
}

/// The rider's existing bid on a booking, if any; (booking, rider) is the
/// upsert key.
#[tracing::instrument(skip(tx))]
pub async fn fetch_rider_bid_for_update(
    tx: &mut Transaction<'_, Database>,
    booking_id: &Uuid,
    rider_id: &Uuid,
) -> Result<Option<Bid>, Error> {
    let maybe_result = tx
        .fetch_optional(
            sqlx::query(
                "SELECT data FROM bids WHERE booking_id = $1 AND rider_id = $2 FOR UPDATE",
            )
            .bind(booking_id)
            .bind(rider_id),
        )
        .await?;

    match maybe_result {
        Some(row) => {
            let Json(bid) = row.try_get("data")?;
            Ok(Some(bid))
        }
        None => Ok(None),
    }
}

#[tracing::instrument(skip(tx, booking))]
pub async fn update_booking(
    tx: &mut Transaction<'_, Database>,
    booking: &Booking,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bookings SET status = $2, data = $3 WHERE id = $1")
            .bind(&booking.id)
            .bind(booking.status.name())
            .bind(Json(booking)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, bid))]
pub async fn insert_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO bids (id, booking_id, rider_id, status, data) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&bid.id)
        .bind(&bid.booking_id)
        .bind(&bid.rider_id)
        .bind(bid.status.name())
        .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, bid))]
pub async fn update_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bids SET status = $2, data = $3 WHERE id = $1")
            .bind(&bid.id)
            .bind(bid.status.name())
            .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

/// Locks the singleton ledger row for the rest of the transaction, creating
/// it on first use. Every check-then-increment sequence happens under this
/// lock.
#[tracing::instrument(skip(tx))]
pub async fn fetch_ride_limit_for_update(
    tx: &mut Transaction<'_, Database>,
    daily_limit: u32,
    today: NaiveDate,
) -> Result<RideLimit, Error> {
    let fresh = RideLimit::new(daily_limit, today);

    tx.execute(
        sqlx::query("INSERT INTO ride_limits (id, data) VALUES (1, $1) ON CONFLICT (id) DO NOTHING")
            .bind(Json(&fresh)),
    )
    .await?;

    let Json(mut limit): Json<RideLimit> = tx
        .fetch_one(sqlx::query("SELECT data FROM ride_limits WHERE id = 1 FOR UPDATE"))
        .await?
        .try_get("data")?;

    // the configured cap is authoritative; the row only persists usage
    limit.daily_limit = daily_limit;

    Ok(limit)
}

#[tracing::instrument(skip(tx, limit))]
pub async fn update_ride_limit(
    tx: &mut Transaction<'_, Database>,
    limit: &RideLimit,
) -> Result<(), Error> {
    tx.execute(sqlx::query("UPDATE ride_limits SET data = $1 WHERE id = 1").bind(Json(limit)))
        .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_app_commission(
    tx: &mut Transaction<'_, Database>,
) -> Result<Commission, Error> {
    let Json(commission): Json<Commission> = tx
        .fetch_optional(sqlx::query("SELECT data FROM app_commission WHERE id = 1"))
        .await?
        .ok_or_else(Error::commission_not_configured_error)?
        .try_get("data")?;

    Ok(commission)
}
