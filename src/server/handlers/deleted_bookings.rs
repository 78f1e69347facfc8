use axum::extract::{Extension, Json, Path, Query};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{DeletedBookingPage, DynAPI};
use crate::auth::User;
use crate::entities::DeletedBooking;
use crate::error::Error;

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
    Query(params): Query<PageParams>,
) -> Result<Json<DeletedBookingPage>, Error> {
    let page = api
        .list_deleted_bookings(user, params.page, params.per_page)
        .await?;

    Ok(page.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedBooking>, Error> {
    let deleted = api.find_deleted_booking(user, id).await?;

    Ok(deleted.into())
}
