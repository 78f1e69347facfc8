use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::env;
use std::net::SocketAddr;

use crate::error::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DAILY_RIDE_LIMIT: u32 = 10;

// The service day follows the deployment's local calendar, not UTC.
const DEFAULT_DAY_OFFSET_MINUTES: i32 = 330;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub limits: LimitPolicy,
}

/// The quota settings shared by every rate-limited operation: the global
/// daily cap and the UTC offset that defines when a "day" rolls over.
#[derive(Clone, Copy, Debug)]
pub struct LimitPolicy {
    pub daily_limit: u32,
    pub day_offset: FixedOffset,
}

impl LimitPolicy {
    pub fn service_day(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.day_offset).date_naive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let database_url = env::var("DATABASE_URL")?;

        let database_max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.into())
            .parse()
            .map_err(|_| Error::config_error("invalid LISTEN_ADDR"))?;

        let daily_limit = parse_var("DAILY_RIDE_LIMIT")?.unwrap_or(DEFAULT_DAILY_RIDE_LIMIT);

        let offset_minutes: i32 =
            parse_var("SERVICE_DAY_UTC_OFFSET_MINUTES")?.unwrap_or(DEFAULT_DAY_OFFSET_MINUTES);
        let day_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| Error::config_error("invalid SERVICE_DAY_UTC_OFFSET_MINUTES"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            listen_addr,
            limits: LimitPolicy {
                daily_limit,
                day_offset,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::config_error(&format!("invalid {}", name))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn service_day_follows_configured_offset() {
        let policy = LimitPolicy {
            daily_limit: 10,
            day_offset: FixedOffset::east_opt(330 * 60).unwrap(),
        };

        // 19:00 UTC is already the next calendar day at UTC+05:30.
        let late_evening = Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap();
        assert_eq!(
            policy.service_day(late_evening),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );

        let morning = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(
            policy.service_day(morning),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
