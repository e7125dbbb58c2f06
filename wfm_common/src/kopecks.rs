use std::{
    fmt::Display,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

pub const RUB_CURRENCY_CODE: &str = "RUB";

//--------------------------------------      Kopecks       ----------------------------------------------------------
/// A monetary amount in kopecks, the minor unit of the rouble. All amounts crossing the payment gateway are
/// expressed in minor units; 100 kopecks = 1 rouble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Kopecks(i64);

impl From<i64> for Kopecks {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Kopecks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Kopecks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Display for Kopecks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:02} ₽", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Kopecks {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_roubles(roubles: i64) -> Self {
        Self(roubles * 100)
    }

    /// The amount in roubles, rendered with two fraction digits (e.g. `199.00`). This is the form purchase
    /// records and receipts carry.
    pub fn to_rouble_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_uses_two_fraction_digits() {
        assert_eq!(Kopecks::from(19900).to_string(), "199.00 ₽");
        assert_eq!(Kopecks::from(505).to_string(), "5.05 ₽");
        assert_eq!(Kopecks::from(-505).to_string(), "-5.05 ₽");
    }

    #[test]
    fn rouble_conversions() {
        assert_eq!(Kopecks::from_roubles(42).value(), 4200);
        assert_eq!(Kopecks::from(12345).to_rouble_string(), "123.45");
    }

    #[test]
    fn arithmetic_stays_in_minor_units() {
        assert_eq!(Kopecks::from(9900) + Kopecks::from(100), Kopecks::from(10000));
        assert_eq!(Kopecks::from(9900) - Kopecks::from(400), Kopecks::from(9500));
    }
}
