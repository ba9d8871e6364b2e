//! Expiration Module
//!
//! Expiration policy configured once on a store and applied to every write.
//! Encodes to the numeric exptime used by memcached: zero means never,
//! small values are seconds from now, larger ones are Unix timestamps.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Largest exptime interpreted as relative seconds (30 days).
pub const MAX_RELATIVE_EXPIRATION_SECS: u32 = 60 * 60 * 24 * 30;

// == Expiration ==
/// When stored entries stop being visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expiration {
    /// Entries never expire
    #[default]
    Never,
    /// Entries expire this long after being written
    After(Duration),
    /// Entries expire at a fixed point in time
    At(DateTime<Utc>),
}

impl Expiration {
    // == To Exptime ==
    /// Encodes the policy as a memcached exptime relative to `now`.
    ///
    /// Relative durations beyond 30 days are converted to absolute
    /// timestamps. Sub-second durations round up to one second so they
    /// never turn into "no expiration". Absolute times in the distant past
    /// encode to a timestamp that is already expired.
    pub fn to_exptime(&self, now: DateTime<Utc>) -> u32 {
        match self {
            Expiration::Never => 0,
            Expiration::After(ttl) => {
                let mut secs = ttl.as_secs();
                if ttl.subsec_nanos() > 0 || secs == 0 {
                    secs = secs.saturating_add(1);
                }
                if secs <= u64::from(MAX_RELATIVE_EXPIRATION_SECS) {
                    secs as u32
                } else {
                    let absolute = now
                        .timestamp()
                        .saturating_add(i64::try_from(secs).unwrap_or(i64::MAX));
                    clamp_timestamp(absolute)
                }
            }
            Expiration::At(at) => clamp_timestamp(at.timestamp()),
        }
    }

    // == From Exptime ==
    /// Classifies a memcached exptime.
    pub fn from_exptime(exptime: u32) -> Self {
        match exptime {
            0 => Expiration::Never,
            secs if secs <= MAX_RELATIVE_EXPIRATION_SECS => {
                Expiration::After(Duration::from_secs(u64::from(secs)))
            }
            ts => DateTime::from_timestamp(i64::from(ts), 0)
                .map(Expiration::At)
                .unwrap_or(Expiration::Never),
        }
    }

    // == Deadline ==
    /// The instant an entry written at `now` expires, `None` for never.
    ///
    /// Durations too large to represent are treated as never expiring.
    pub fn deadline_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expiration::Never => None,
            Expiration::After(ttl) => chrono::Duration::from_std(*ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl)),
            Expiration::At(at) => Some(*at),
        }
    }
}

fn clamp_timestamp(ts: i64) -> u32 {
    let floor = i64::from(MAX_RELATIVE_EXPIRATION_SECS) + 1;
    u32::try_from(ts.max(floor)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_never_is_zero() {
        assert_eq!(Expiration::Never.to_exptime(fixed_now()), 0);
        assert_eq!(Expiration::from_exptime(0), Expiration::Never);
        assert!(Expiration::Never.deadline_from(fixed_now()).is_none());
    }

    #[test]
    fn test_relative_within_thirty_days() {
        let exp = Expiration::After(Duration::from_secs(300));
        assert_eq!(exp.to_exptime(fixed_now()), 300);
        assert_eq!(Expiration::from_exptime(300), exp);
    }

    #[test]
    fn test_sub_second_rounds_up() {
        let exp = Expiration::After(Duration::from_millis(1500));
        assert_eq!(exp.to_exptime(fixed_now()), 2);
        let zero = Expiration::After(Duration::ZERO);
        assert_eq!(zero.to_exptime(fixed_now()), 1);
    }

    #[test]
    fn test_long_relative_becomes_absolute() {
        let now = fixed_now();
        let secs = u64::from(MAX_RELATIVE_EXPIRATION_SECS) + 10;
        let exp = Expiration::After(Duration::from_secs(secs));
        let exptime = exp.to_exptime(now);
        assert_eq!(i64::from(exptime), now.timestamp() + secs as i64);
    }

    #[test]
    fn test_absolute_timestamp() {
        let at = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let exp = Expiration::At(at);
        let exptime = exp.to_exptime(fixed_now());
        assert_eq!(i64::from(exptime), at.timestamp());
        assert_eq!(Expiration::from_exptime(exptime), exp);
    }

    #[test]
    fn test_distant_past_stays_absolute() {
        let at = Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap();
        let exptime = Expiration::At(at).to_exptime(fixed_now());
        assert!(exptime > MAX_RELATIVE_EXPIRATION_SECS);
    }

    #[test]
    fn test_deadline_from() {
        let now = fixed_now();
        let exp = Expiration::After(Duration::from_secs(60));
        assert_eq!(
            exp.deadline_from(now),
            Some(now + chrono::Duration::seconds(60))
        );
    }
}
