//! Hop distance with an explicit "not yet reached" state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw encoding of [`Distance::Unknown`] at the persistence boundary.
pub const UNKNOWN_RAW: i64 = -1;

/// Best-known hop count from any seed.
///
/// `Unknown` behaves like infinity: it never wins a comparison against a
/// concrete distance. Not `Ord`; compare with [`Distance::best`] and
/// [`Distance::improves_on`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Distance {
    #[default]
    Unknown,
    Hops(u64),
}

impl Distance {
    pub const ZERO: Distance = Distance::Hops(0);

    /// Decode the wire value: `-1` is unknown, any other negative is invalid.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            UNKNOWN_RAW => Some(Distance::Unknown),
            n if n >= 0 => Some(Distance::Hops(n as u64)),
            _ => None,
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Distance::Unknown => UNKNOWN_RAW,
            Distance::Hops(h) => i64::try_from(h).unwrap_or(i64::MAX),
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Distance::Hops(_))
    }

    /// Distance offered to a neighbor one hop further away.
    pub fn relax(self) -> Self {
        match self {
            Distance::Unknown => Distance::Unknown,
            Distance::Hops(h) => Distance::Hops(h.saturating_add(1)),
        }
    }

    /// Numeric minimum where `Unknown` only survives against itself.
    pub fn best(self, other: Self) -> Self {
        match (self, other) {
            (Distance::Hops(a), Distance::Hops(b)) => Distance::Hops(a.min(b)),
            (Distance::Hops(_), Distance::Unknown) => self,
            (Distance::Unknown, _) => other,
        }
    }

    /// True when `self` is strictly shorter than `previous`.
    pub fn improves_on(self, previous: Self) -> bool {
        match (self, previous) {
            (Distance::Hops(a), Distance::Hops(b)) => a < b,
            (Distance::Hops(_), Distance::Unknown) => true,
            (Distance::Unknown, _) => false,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl TryFrom<i64> for Distance {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Distance::from_raw(raw)
            .ok_or_else(|| format!("invalid distance {raw}: only {UNKNOWN_RAW} may be negative"))
    }
}

impl From<Distance> for i64 {
    fn from(d: Distance) -> i64 {
        d.to_raw()
    }
}

impl From<u64> for Distance {
    fn from(h: u64) -> Self {
        Distance::Hops(h)
    }
}
