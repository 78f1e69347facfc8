use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The platform's commission scheme. Bids snapshot the scheme in force at
/// submission time; later configuration changes never touch existing bids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Commission {
    Percentage { value: f64 },
    Fixed { value: f64 },
}

impl Commission {
    pub fn commission_amount(&self, base: f64) -> f64 {
        match self {
            Self::Percentage { value } => base * value / 100.0,
            Self::Fixed { value } => *value,
        }
    }

    pub fn rider_income(&self, base: f64) -> f64 {
        base - self.commission_amount(base)
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Percentage { value } => {
                if !(0.0..=100.0).contains(value) {
                    return Err(Error::validation_error(
                        "percentage commission must be between 0 and 100",
                    ));
                }
            }
            Self::Fixed { value } => {
                if !value.is_finite() || *value < 0.0 {
                    return Err(Error::validation_error(
                        "fixed commission must be a non-negative amount",
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_income() {
        let commission = Commission::Percentage { value: 10.0 };

        assert_eq!(commission.commission_amount(1000.0), 100.0);
        assert_eq!(commission.rider_income(1000.0), 900.0);
    }

    #[test]
    fn fixed_income() {
        let commission = Commission::Fixed { value: 150.0 };

        assert_eq!(commission.commission_amount(1000.0), 150.0);
        assert_eq!(commission.rider_income(1000.0), 850.0);
    }

    #[test]
    fn validation_bounds() {
        assert!(Commission::Percentage { value: 100.0 }.validate().is_ok());
        assert!(Commission::Percentage { value: 101.0 }.validate().is_err());
        assert!(Commission::Fixed { value: 0.0 }.validate().is_ok());
        assert!(Commission::Fixed { value: -1.0 }.validate().is_err());
    }
}
