use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{BidReceipt, DynAPI};
use crate::auth::User;
use crate::entities::Bid;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    booking_id: Uuid,
    amount: f64,
    vehicle: String,
}

#[derive(Serialize, Deserialize)]
pub struct AcceptParams {
    booking_id: Uuid,
}

#[axum_macros::debug_handler]
pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<CreateParams>,
) -> Result<Json<BidReceipt>, Error> {
    let receipt = api
        .submit_bid(user, params.booking_id, params.amount, params.vehicle)
        .await?;

    Ok(receipt.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<AcceptParams>,
) -> Result<Json<Value>, Error> {
    api.accept_bid(user, id, params.booking_id).await?;

    Ok(Json(json!({ "msg": "bid accepted" })))
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<Bid>>, Error> {
    let bids = api.list_bids(user, booking_id).await?;

    Ok(bids.into())
}
