use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A signed count of seconds from an arbitrary epoch.
///
/// Only add/sub/compare are meaningful; no calendar arithmetic is performed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seconds(pub i64);

impl Seconds {
    /// Sentinel "before any stage" ready time. Any realistic machine earliest-available-time
    /// (parsed from a wall-clock timestamp) lies strictly after this.
    pub const EPOCH_ZERO: Seconds = Seconds(0);

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl Add for Seconds {
    type Output = Seconds;
    fn add(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 + rhs.0)
    }
}

impl Sub for Seconds {
    type Output = Seconds;
    fn sub(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 - rhs.0)
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A signed count of minutes, as read from the processing/transport-time tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Minutes(pub i64);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0);

    /// Converts to seconds at the point of arithmetic, per the minutes-to-seconds contract.
    pub fn to_seconds(self) -> Seconds {
        Seconds(self.0 * 60)
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}min", self.0)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::{Minutes, Seconds};

    #[rstest]
    #[case(0, 0)]
    #[case(1, 60)]
    #[case(10, 600)]
    #[case(-5, -300)]
    fn minutes_convert_to_seconds_at_a_rate_of_sixty(#[case] minutes: i64, #[case] seconds: i64) {
        assert_eq!(Minutes(minutes).to_seconds(), Seconds(seconds));
    }

    #[test]
    fn seconds_add_and_sub_are_inverse() {
        let a = Seconds(100);
        let b = Seconds(40);
        assert_eq!(a - b + b, a);
    }
}
