/*
Exact decimal durations (hours).
All accumulation goes through Decimal; f64 is only handed out for thresholds.
*/

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{Error, Result};

// Amount of time in hours.
//     Values parsed from outside are never negative,
//     but subtraction may produce a negative result that callers must check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(Decimal);

impl Duration {
    pub const ZERO: Duration = Duration(Decimal::ZERO);

    pub fn from_decimal(value: Decimal) -> Self {
        Duration(value)
    }

    pub fn hours(hours: i64) -> Self {
        Duration(Decimal::from(hours))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    // Saturates at the representable maximum instead of panicking.
    pub fn add(self, other: Duration) -> Duration {
        match self.0.checked_add(other.0) {
            Some(sum) => Duration(sum),
            None => {
                warn!(left = %self, right = %other, "duration addition overflowed, saturating");
                Duration(Decimal::MAX)
            }
        }
    }

    // May be negative; see `is_negative`.
    pub fn sub(self, other: Duration) -> Duration {
        match self.0.checked_sub(other.0) {
            Some(difference) => Duration(difference),
            None => {
                warn!(left = %self, right = %other, "duration subtraction overflowed, saturating");
                Duration(Decimal::MIN)
            }
        }
    }

    pub fn compare(&self, other: &Duration) -> Ordering {
        self.0.cmp(&other.0)
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    // Only for threshold comparisons, never for accumulation.
    pub fn to_number(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration::add(self, rhs)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration::sub(self, rhs)
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
        iter.fold(Duration::ZERO, Duration::add)
    }
}

impl<'a> Sum<&'a Duration> for Duration {
    fn sum<I: Iterator<Item = &'a Duration>>(iter: I) -> Duration {
        iter.copied().sum()
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| Error::InvalidDurationFormat(s.to_string()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::InvalidDurationFormat(s.to_string()));
        }
        Ok(Duration(value.normalize()))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal duration as string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Duration, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Duration, E> {
        Ok(Duration(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Duration, E> {
        if v < 0 {
            return Err(E::custom(Error::InvalidDurationFormat(v.to_string())));
        }
        Ok(Duration(Decimal::from(v)))
    }

    // Shortest round-trip formatting keeps "1.5" as 1.5 rather than its binary expansion.
    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Duration, E> {
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }
}
