use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};

use crate::{
    api::CommissionAPI,
    auth::{Platform, User},
    entities::Commission,
    error::Error,
};

#[async_trait]
impl CommissionAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn get_app_commission(&self, user: User) -> Result<Commission, Error> {
        self.authorize(user.clone(), "read_commission", Platform::default())?;

        let mut conn = self.pool.acquire().await?;

        let Json(commission): Json<Commission> = conn
            .fetch_optional(sqlx::query("SELECT data FROM app_commission WHERE id = 1"))
            .await?
            .ok_or_else(Error::commission_not_configured_error)?
            .try_get("data")?;

        Ok(commission)
    }

    #[tracing::instrument(skip(self))]
    async fn set_app_commission(
        &self,
        user: User,
        commission: Commission,
    ) -> Result<Commission, Error> {
        self.authorize(user.clone(), "configure", Platform::default())?;

        commission.validate()?;

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO app_commission (id, data) VALUES (1, $1) ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data",
            )
            .bind(Json(&commission)),
        )
        .await?;

        Ok(commission)
    }
}
