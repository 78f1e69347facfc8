pub mod app_commission;
pub mod bids;
pub mod bookings;
pub mod deleted_bookings;
pub mod ride_limits;
