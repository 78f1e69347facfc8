use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{RideAllowance, RideLimitAPI},
    auth::{Platform, User},
    entities::RideLimit,
    error::Error,
};

#[async_trait]
impl RideLimitAPI for Engine {
    /// Rollover-aware read of a rider's remaining quota. Never mutates the
    /// ledger; a stale ledger simply reads as a fresh day.
    #[tracing::instrument(skip(self))]
    async fn remaining_rides(&self, user: User, rider_id: Uuid) -> Result<RideAllowance, Error> {
        if user.id != rider_id {
            self.authorize(user.clone(), "audit", Platform::default())?;
        }

        let today = self.service_day(self.now());

        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM ride_limits WHERE id = 1"))
            .await?;

        let allowance = match maybe_result {
            Some(row) => {
                let Json(mut limit): Json<RideLimit> = row.try_get("data")?;
                limit.daily_limit = self.limits.daily_limit;

                RideAllowance {
                    rider_id,
                    rides_used: limit.rides_used(&rider_id, today),
                    remaining_rides: limit.remaining_rides(&rider_id, today),
                    daily_limit: limit.daily_limit,
                }
            }
            None => RideAllowance {
                rider_id,
                rides_used: 0,
                remaining_rides: self.limits.daily_limit,
                daily_limit: self.limits.daily_limit,
            },
        };

        Ok(allowance)
    }
}
