//! Cultivation rank.
//!
//! A tier reads like a decimal number (`1.3`): the integer part is the
//! major realm, the single fractional digit is the sub-rank. Storing the
//! two parts as integers keeps comparisons and increments exact; the
//! `f64` form exists only at the serialization and prompt boundaries.

use serde::{Deserialize, Serialize};

/// Errors raised when building a [`Tier`] from untrusted input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TierError {
    /// The value is not a finite number between the lowest and highest tier.
    #[error("tier {value} is outside the range {min}..={max}")]
    OutOfRange {
        /// The rejected value.
        value: f64,
        /// Lowest representable tier.
        min: f64,
        /// Highest representable tier.
        max: f64,
    },
}

/// A cultivation rank: major realm plus a sub-rank digit in `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tier {
    major: u8,
    sub: u8,
}

impl Tier {
    /// Lowest major realm.
    pub const MIN_MAJOR: u8 = 1;
    /// Highest major realm.
    pub const MAX_MAJOR: u8 = 6;
    /// Highest sub-rank digit.
    pub const MAX_SUB: u8 = 9;

    /// The starting rank of every new character (`1.0`).
    pub const FLOOR: Self = Self {
        major: Self::MIN_MAJOR,
        sub: 0,
    };

    /// The highest attainable rank (`6.9`).
    pub const CEILING: Self = Self {
        major: Self::MAX_MAJOR,
        sub: Self::MAX_SUB,
    };

    /// Build a tier from its parts, rejecting out-of-range digits.
    pub const fn new(major: u8, sub: u8) -> Option<Self> {
        if major < Self::MIN_MAJOR || major > Self::MAX_MAJOR || sub > Self::MAX_SUB {
            return None;
        }
        Some(Self { major, sub })
    }

    /// Major realm (integer part).
    pub const fn major(self) -> u8 {
        self.major
    }

    /// Sub-rank digit (fractional part).
    pub const fn sub(self) -> u8 {
        self.sub
    }

    /// Advance by `steps` sub-ranks, carrying into the next major realm.
    ///
    /// `1.9` advanced by 3 is `2.2`. Saturates at [`Tier::CEILING`].
    pub fn advance(self, steps: u8) -> Self {
        let ordinal = self.ordinal().saturating_add(u16::from(steps));
        Self::from_ordinal(ordinal).unwrap_or(Self::CEILING)
    }

    /// Floating-point view, for prompts and serialization.
    pub fn as_f64(self) -> f64 {
        f64::from(self.major) + f64::from(self.sub) / 10.0
    }

    fn ordinal(self) -> u16 {
        u16::from(self.major)
            .saturating_mul(10)
            .saturating_add(u16::from(self.sub))
    }

    fn from_ordinal(ordinal: u16) -> Option<Self> {
        let major = u8::try_from(ordinal.checked_div(10)?).ok()?;
        let sub = u8::try_from(ordinal.checked_rem(10)?).ok()?;
        Self::new(major, sub)
    }

    fn out_of_range(value: f64) -> TierError {
        TierError::OutOfRange {
            value,
            min: Self::FLOOR.as_f64(),
            max: Self::CEILING.as_f64(),
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::FLOOR
    }
}

impl TryFrom<f64> for Tier {
    type Error = TierError;

    /// Rounds to one decimal place, then splits on the decimal point.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(Self::out_of_range(value));
        }
        let text = format!("{value:.1}");
        let (major, sub) = text
            .split_once('.')
            .ok_or_else(|| Self::out_of_range(value))?;
        let major: u8 = major.parse().ok().ok_or_else(|| Self::out_of_range(value))?;
        let sub: u8 = sub.parse().ok().ok_or_else(|| Self::out_of_range(value))?;
        Self::new(major, sub).ok_or_else(|| Self::out_of_range(value))
    }
}

impl From<Tier> for f64 {
    fn from(tier: Tier) -> Self {
        tier.as_f64()
    }
}

impl core::fmt::Display for Tier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.major, self.sub)
    }
}
