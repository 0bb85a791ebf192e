//! Cache ids: the timestamp-bearing directory name of every cached upload.
//!
//! Two formats exist in stored keys and both must keep parsing:
//!
//! - legacy: `<unix-ts>-<pid>-<rand>`
//! - current: `<unix-ts>-<rand>-<counter:04>-<rand:04>`

use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

use crate::util::Clock;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A path segment that is not a cache id. Never leaves the crate: the sweeper skips such keys.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{0}' is not a cache id")]
pub(crate) struct UnparseableCacheId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheIdFormat {
    Legacy,
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheId {
    raw: String,
    created_at: DateTime<Utc>,
    format: CacheIdFormat,
}

impl CacheId {
    pub fn generate(clock: &dyn Clock) -> Self {
        Self::generate_at(clock.now())
    }

    /// New current-format id stamped with `now`.
    pub fn generate_at(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) % 10_000;
        let raw = format!(
            "{}-{}-{:04}-{:04}",
            now.timestamp(),
            rng.gen_range(0..1_000_000_000_000_000u64),
            counter,
            rng.gen_range(0..10_000u32)
        );
        Self {
            raw,
            // sub-second precision is not encoded
            created_at: DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now),
            format: CacheIdFormat::Current,
        }
    }

    /// Parse a path segment, trying the legacy format before the current one.
    pub(crate) fn parse(segment: &str) -> Result<Self, UnparseableCacheId> {
        let unparseable = || UnparseableCacheId(segment.to_string());

        let parts: Vec<&str> = segment.split('-').collect();
        if parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(unparseable());
        }

        let format = match parts.as_slice() {
            [_, _, _] => CacheIdFormat::Legacy,
            [_, _, counter, rand] if counter.len() == 4 && rand.len() == 4 => CacheIdFormat::Current,
            _ => return Err(unparseable()),
        };

        let created_at = parts[0]
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .ok_or_else(unparseable)?;

        Ok(Self {
            raw: segment.to_string(),
            created_at,
            format,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn format(&self) -> CacheIdFormat {
        self.format
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for CacheId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::FixedClock;

    #[test]
    fn test_generate_round_trips_timestamp() {
        let clock = FixedClock::at_timestamp(1_369_894_322);
        let id = CacheId::generate(&clock);
        assert_eq!(id.format(), CacheIdFormat::Current);

        let parsed = CacheId::parse(id.as_str()).unwrap();
        assert_eq!(parsed.created_at().timestamp(), 1_369_894_322);
        assert_eq!(parsed.format(), CacheIdFormat::Current);
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_generated_ids_differ() {
        let now = Utc::now();
        assert_ne!(CacheId::generate_at(now), CacheId::generate_at(now));
    }

    #[test]
    fn test_parse_legacy() {
        let id = CacheId::parse("1369894322-100-1234").unwrap();
        assert_eq!(id.format(), CacheIdFormat::Legacy);
        assert_eq!(id.created_at().timestamp(), 1_369_894_322);
    }

    #[test]
    fn test_parse_current() {
        let id = CacheId::parse("1369894322-123456789012-0042-9876").unwrap();
        assert_eq!(id.format(), CacheIdFormat::Current);
        assert_eq!(id.to_string(), "1369894322-123456789012-0042-9876");
    }

    #[test]
    fn test_parse_rejects_other_segments() {
        for segment in [
            "invalid",
            "",
            "test.jpg",
            "1369894322",
            "1369894322-100",
            "1369894322-100-",
            "abc-100-1234",
            "1369894322-1-42-9876",
            "1369894322-1-0042-9876-1",
            "20130530-1012-345-1234-2255",
        ] {
            assert_eq!(
                CacheId::parse(segment),
                Err(UnparseableCacheId(segment.to_string())),
                "segment {:?}",
                segment
            );
        }
    }

    #[test]
    fn test_from_str() {
        assert!("1369894322-100-1234".parse::<CacheId>().is_ok());
        assert!("invalid".parse::<CacheId>().is_err());
    }
}
