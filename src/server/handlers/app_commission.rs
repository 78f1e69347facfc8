use axum::extract::{Extension, Json};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::Commission;
use crate::error::Error;

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Commission>, Error> {
    let commission = api.get_app_commission(user).await?;

    Ok(commission.into())
}

pub async fn set(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(commission): Json<Commission>,
) -> Result<Json<Commission>, Error> {
    let commission = api.set_app_commission(user, commission).await?;

    Ok(commission.into())
}
