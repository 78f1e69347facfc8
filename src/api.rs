use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{
    Bid, Booking, BookingStatus, Commission, DeletedBooking, RestoredRider, Stop,
};
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingDraft {
    pub pickup: Stop,
    pub destination: Stop,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub rider_amount: f64,
    pub commission: f64,
    pub number_of_guests: u32,
    pub vehicle_type: String,
    pub phone_number: String,
}

/// Returned from bid submission so the client can show the rider's
/// remaining allowance without a second round-trip.
#[derive(Clone, Debug, Serialize)]
pub struct BidReceipt {
    pub bid: Bid,
    pub remaining_rides: u32,
    pub daily_limit: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RideAllowance {
    pub rider_id: Uuid,
    pub rides_used: u32,
    pub remaining_rides: u32,
    pub daily_limit: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeletionSummary {
    pub booking_id: Uuid,
    pub deleted_bids: u32,
    pub restored_riders: Vec<RestoredRider>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeletedBookingPage {
    pub items: Vec<DeletedBooking>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[async_trait]
pub trait BookingAPI {
    async fn create_booking(&self, user: User, draft: BookingDraft) -> Result<Booking, Error>;
    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;
    async fn accept_booking(&self, user: User, id: Uuid, vehicle: String)
        -> Result<Booking, Error>;
    async fn reject_ride(&self, user: User, id: Uuid, reason: String) -> Result<Booking, Error>;
    async fn start_ride(&self, user: User, id: Uuid) -> Result<Booking, Error>;
    async fn finish_ride(&self, user: User, id: Uuid) -> Result<Booking, Error>;
    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;
    async fn set_booking_status(
        &self,
        user: User,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, Error>;
    async fn delete_booking(
        &self,
        user: User,
        id: Uuid,
        reason: String,
    ) -> Result<DeletionSummary, Error>;
}

#[async_trait]
pub trait BidAPI {
    async fn submit_bid(
        &self,
        user: User,
        booking_id: Uuid,
        amount: f64,
        vehicle: String,
    ) -> Result<BidReceipt, Error>;
    async fn accept_bid(&self, user: User, bid_id: Uuid, booking_id: Uuid) -> Result<(), Error>;
    async fn list_bids(&self, user: User, booking_id: Uuid) -> Result<Vec<Bid>, Error>;
}

#[async_trait]
pub trait RideLimitAPI {
    async fn remaining_rides(&self, user: User, rider_id: Uuid) -> Result<RideAllowance, Error>;
}

#[async_trait]
pub trait CommissionAPI {
    async fn get_app_commission(&self, user: User) -> Result<Commission, Error>;
    async fn set_app_commission(
        &self,
        user: User,
        commission: Commission,
    ) -> Result<Commission, Error>;
}

#[async_trait]
pub trait AuditAPI {
    async fn list_deleted_bookings(
        &self,
        user: User,
        page: u32,
        per_page: u32,
    ) -> Result<DeletedBookingPage, Error>;
    async fn find_deleted_booking(&self, user: User, id: Uuid) -> Result<DeletedBooking, Error>;
}

pub trait API: BookingAPI + BidAPI + RideLimitAPI + CommissionAPI + AuditAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
