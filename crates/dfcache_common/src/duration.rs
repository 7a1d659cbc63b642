//! Relative time spans parsed from strings like `"30m"` or `"1.5d"`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// A time-to-live span for cached artifacts.
///
/// Parses from a number (integer or decimal) followed by an optional
/// single-letter unit: `s`, `m`, `h`, `d` or `w`. A bare number is
/// interpreted as seconds. Parsing is case-insensitive and ignores
/// surrounding whitespace. Displays using the largest unit that represents
/// the span exactly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TtlDuration(Duration);

impl TtlDuration {
    /// Creates a span from a whole number of seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Returns the span as a standard library [`Duration`].
    pub fn as_std(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for TtlDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl fmt::Debug for TtlDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TtlDuration({self})")
    }
}

impl fmt::Display for TtlDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.subsec_nanos() != 0 {
            return write!(f, "{}s", self.0.as_secs_f64());
        }
        let secs = self.0.as_secs();
        if secs == 0 {
            return write!(f, "0s");
        }
        for (unit, size) in [("w", WEEK), ("d", DAY), ("h", HOUR), ("m", MINUTE)] {
            if secs % size == 0 {
                return write!(f, "{}{unit}", secs / size);
            }
        }
        write!(f, "{secs}s")
    }
}

/// Error type for parsing duration strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    /// The input was empty or only whitespace.
    #[error("duration string cannot be empty")]
    Empty,

    /// The input did not match `<number><unit>`.
    #[error("invalid duration format: '{input}'. Use formats like '1d', '2h', '30m', '1w'")]
    Invalid {
        /// The input string that failed to parse.
        input: String,
    },

    /// The input parsed but names a span too large to represent.
    #[error("duration out of range: '{input}'")]
    OutOfRange {
        /// The input string that failed to parse.
        input: String,
    },
}

impl FromStr for TtlDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DurationError::Empty);
        }
        let invalid = || DurationError::Invalid {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (number, unit_secs) = match lower.as_bytes()[lower.len() - 1] {
            b's' => (&lower[..lower.len() - 1], 1),
            b'm' => (&lower[..lower.len() - 1], MINUTE),
            b'h' => (&lower[..lower.len() - 1], HOUR),
            b'd' => (&lower[..lower.len() - 1], DAY),
            b'w' => (&lower[..lower.len() - 1], WEEK),
            // Bare number: seconds
            b'0'..=b'9' => (lower.as_str(), 1),
            _ => return Err(invalid()),
        };

        if !is_plain_decimal(number) {
            return Err(invalid());
        }
        let value: f64 = number.parse().map_err(|_| invalid())?;

        Duration::try_from_secs_f64(value * unit_secs as f64)
            .map(TtlDuration)
            .map_err(|_| DurationError::OutOfRange {
                input: s.to_string(),
            })
    }
}

/// Accepts `digits` or `digits.digits`; rejects signs, exponents and `inf`.
fn is_plain_decimal(s: &str) -> bool {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}
