use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{BookingDraft, DeletionSummary, DynAPI};
use crate::auth::User;
use crate::entities::{Booking, BookingStatus};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct AcceptParams {
    vehicle: String,
}

#[derive(Serialize, Deserialize)]
pub struct ReasonParams {
    reason: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusParams {
    status: BookingStatus,
}

#[axum_macros::debug_handler]
pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(draft): Json<BookingDraft>,
) -> Result<Json<Booking>, Error> {
    let booking = api.create_booking(user, draft).await?;

    Ok(booking.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.find_booking(user, id).await?;

    Ok(booking.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<AcceptParams>,
) -> Result<Json<Booking>, Error> {
    let booking = api.accept_booking(user, id, params.vehicle).await?;

    Ok(booking.into())
}

pub async fn reject(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<ReasonParams>,
) -> Result<Json<Booking>, Error> {
    let booking = api.reject_ride(user, id, params.reason).await?;

    Ok(booking.into())
}

pub async fn start(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.start_ride(user, id).await?;

    Ok(booking.into())
}

pub async fn finish(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.finish_ride(user, id).await?;

    Ok(booking.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.cancel_booking(user, id).await?;

    Ok(booking.into())
}

pub async fn set_status(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<StatusParams>,
) -> Result<Json<Booking>, Error> {
    let booking = api.set_booking_status(user, id, params.status).await?;

    Ok(booking.into())
}

pub async fn remove(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<ReasonParams>,
) -> Result<Json<DeletionSummary>, Error> {
    let summary = api.delete_booking(user, id, params.reason).await?;

    Ok(summary.into())
}
