use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::{AuditAPI, DeletedBookingPage},
    auth::{Platform, User},
    entities::DeletedBooking,
    error::Error,
};

const MAX_PER_PAGE: u32 = 100;

#[async_trait]
impl AuditAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_deleted_bookings(
        &self,
        user: User,
        page: u32,
        per_page: u32,
    ) -> Result<DeletedBookingPage, Error> {
        self.authorize(user.clone(), "audit", Platform::default())?;

        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);

        let mut conn = self.pool.acquire().await?;

        let total: i64 = conn
            .fetch_one(sqlx::query("SELECT COUNT(*) AS total FROM deleted_bookings"))
            .await?
            .try_get("total")?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM deleted_bookings ORDER BY deleted_at DESC LIMIT $1 OFFSET $2",
                )
                .bind(per_page as i64)
                .bind((page as i64 - 1) * per_page as i64),
            )
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Json(deleted): Json<DeletedBooking> = row.try_get("data")?;
            items.push(deleted);
        }

        let total = total as u64;
        let total_pages = ((total + per_page as u64 - 1) / per_page as u64) as u32;

        Ok(DeletedBookingPage {
            items,
            page,
            per_page,
            total,
            total_pages,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn find_deleted_booking(&self, user: User, id: Uuid) -> Result<DeletedBooking, Error> {
        self.authorize(user.clone(), "audit", Platform::default())?;

        let mut conn = self.pool.acquire().await?;

        let Json(deleted): Json<DeletedBooking> = conn
            .fetch_optional(sqlx::query("SELECT data FROM deleted_bookings WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(|| Error::not_found_error("deleted booking"))?
            .try_get("data")?;

        Ok(deleted)
    }
}
