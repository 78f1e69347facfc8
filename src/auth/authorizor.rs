use oso::{Oso, PolarClass};

use crate::auth::{Platform, User};
use crate::entities::Booking;

pub fn new() -> Oso {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class()).unwrap();
    o.register_class(User::get_polar_class()).unwrap();
    o.register_class(Booking::get_polar_class()).unwrap();

    o.load_str(include_str!("rules.polar")).unwrap();

    o
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Stop;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    fn user(roles: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn booking(creator: &User) -> Booking {
        Booking::new(
            creator.id,
            Stop {
                city: "Colombo".into(),
                area: None,
            },
            Stop {
                city: "Galle".into(),
                area: None,
            },
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            3000.0,
            300.0,
            1,
            "sedan".into(),
            "0770000000".into(),
            Utc::now(),
        )
    }

    #[test]
    fn booking_creation_roles() {
        let authorizor = new();

        for role in ["hotel", "broker", "admin"] {
            let allowed = authorizor
                .is_allowed(user(&[role]), "create_booking", Platform::default())
                .unwrap();
            assert!(allowed, "{} should create bookings", role);
        }

        let denied = authorizor
            .is_allowed(user(&["rider"]), "create_booking", Platform::default())
            .unwrap();
        assert!(!denied);
    }

    #[test]
    fn riders_bid_and_creators_accept() {
        let authorizor = new();

        let creator = user(&["hotel"]);
        let rider = user(&["rider"]);
        let booking = booking(&creator);

        assert!(authorizor
            .is_allowed(rider.clone(), "submit_bid", booking.clone())
            .unwrap());
        assert!(!authorizor
            .is_allowed(creator.clone(), "submit_bid", booking.clone())
            .unwrap());

        assert!(authorizor
            .is_allowed(creator.clone(), "accept_bid", booking.clone())
            .unwrap());
        assert!(!authorizor
            .is_allowed(rider.clone(), "accept_bid", booking.clone())
            .unwrap());
    }

    #[test]
    fn ride_execution_is_reserved_for_the_assigned_rider() {
        let authorizor = new();

        let creator = user(&["hotel"]);
        let rider = user(&["rider"]);
        let bystander = user(&["rider"]);
        let mut booking = booking(&creator);

        // No assignment yet: nobody may start, reject or finish.
        for action in ["start_ride", "reject_ride", "finish_ride"] {
            assert!(!authorizor
                .is_allowed(rider.clone(), action, booking.clone())
                .unwrap());
        }

        booking.place_bid().unwrap();
        booking.confirm(rider.id, Uuid::new_v4()).unwrap();

        for action in ["start_ride", "reject_ride", "finish_ride"] {
            assert!(authorizor
                .is_allowed(rider.clone(), action, booking.clone())
                .unwrap());
            assert!(!authorizor
                .is_allowed(bystander.clone(), action, booking.clone())
                .unwrap());
            assert!(!authorizor
                .is_allowed(creator.clone(), action, booking.clone())
                .unwrap());
        }
    }

    #[test]
    fn cancellation_parties() {
        let authorizor = new();

        let creator = user(&["hotel"]);
        let rider = user(&["rider"]);
        let stranger = user(&["rider"]);
        let mut booking = booking(&creator);

        assert!(authorizor
            .is_allowed(creator.clone(), "cancel", booking.clone())
            .unwrap());
        assert!(!authorizor
            .is_allowed(stranger.clone(), "cancel", booking.clone())
            .unwrap());

        booking.place_bid().unwrap();
        booking.confirm(rider.id, Uuid::new_v4()).unwrap();

        assert!(authorizor
            .is_allowed(rider.clone(), "cancel", booking.clone())
            .unwrap());
    }

    #[test]
    fn admin_blanket_covers_privileged_actions() {
        let authorizor = new();

        let creator = user(&["hotel"]);
        let admin = user(&["admin"]);
        let booking = booking(&creator);

        assert!(authorizor
            .is_allowed(admin.clone(), "delete", booking.clone())
            .unwrap());
        assert!(authorizor
            .is_allowed(admin.clone(), "audit", Platform::default())
            .unwrap());
        assert!(!authorizor
            .is_allowed(creator.clone(), "delete", booking.clone())
            .unwrap());
        assert!(!authorizor
            .is_allowed(creator.clone(), "audit", Platform::default())
            .unwrap());
    }

    #[test]
    fn commission_visibility() {
        let authorizor = new();

        assert!(authorizor
            .is_allowed(user(&["rider"]), "read_commission", Platform::default())
            .unwrap());
        assert!(!authorizor
            .is_allowed(user(&["hotel"]), "configure", Platform::default())
            .unwrap());
        assert!(authorizor
            .is_allowed(user(&["admin"]), "configure", Platform::default())
            .unwrap());
    }
}
