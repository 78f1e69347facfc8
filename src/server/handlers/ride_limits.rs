use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::{DynAPI, RideAllowance};
use crate::auth::User;
use crate::error::Error;

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(rider_id): Path<Uuid>,
) -> Result<Json<RideAllowance>, Error> {
    let allowance = api.remaining_rides(user, rider_id).await?;

    Ok(allowance.into())
}
