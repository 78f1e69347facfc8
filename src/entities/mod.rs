mod bid;
mod booking;
mod commission;
mod deleted_booking;
mod ride_limit;

pub use bid::{Bid, Status as BidStatus};
pub use booking::{Booking, Rejection, Status as BookingStatus, Stop};
pub use commission::Commission;
pub use deleted_booking::{DeletedBooking, RestoredRider};
pub use ride_limit::{Eligibility, RideLimit, Usage};
