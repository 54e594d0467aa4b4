//! Randomized response delay, mimicking a network round trip.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{AdviceResolver, ResolverError};
use crate::models::AdviceRecord;

/// Inclusive delay range. A zero range disables the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyRange {
    min: Duration,
    max: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LatencyParseError {
    #[error("Invalid latency value: {0}")]
    InvalidNumber(String),
    #[error("Latency minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    Inverted { min_ms: u64, max_ms: u64 },
}

impl LatencyRange {
    pub const DISABLED: Self = Self {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, LatencyParseError> {
        if min_ms > max_ms {
            return Err(LatencyParseError::Inverted { min_ms, max_ms });
        }
        Ok(Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay uniformly from the range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for LatencyRange {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(800),
            max: Duration::from_millis(1500),
        }
    }
}

/// Accepts `off`, a single millisecond value, or `min-max`.
impl FromStr for LatencyRange {
    type Err = LatencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("off") {
            return Ok(Self::DISABLED);
        }
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| LatencyParseError::InvalidNumber(s.to_string()))
        };
        match s.split_once('-') {
            Some((min, max)) => Self::from_millis(parse(min)?, parse(max)?),
            None => {
                let ms = parse(s)?;
                Self::from_millis(ms, ms)
            }
        }
    }
}

/// Delays every call to the wrapped resolver by a sampled duration.
pub struct SimulatedLatency<R> {
    inner: R,
    range: LatencyRange,
}

impl<R> SimulatedLatency<R> {
    pub fn new(inner: R, range: LatencyRange) -> Self {
        Self { inner, range }
    }
}

#[async_trait]
impl<R: AdviceResolver> AdviceResolver for SimulatedLatency<R> {
    async fn resolve(&self, query: &str) -> Result<AdviceRecord, ResolverError> {
        let delay = self.range.sample();
        if !delay.is_zero() {
            tracing::trace!(delay_ms = delay.as_millis() as u64, "Simulating advice latency");
            tokio::time::sleep(delay).await;
        }
        self.inner.resolve(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::RuleTableResolver;
    use std::time::Instant;

    #[test]
    fn parses_range_single_value_and_off() {
        assert_eq!(
            "800-1500".parse::<LatencyRange>().unwrap(),
            LatencyRange::default()
        );
        let fixed: LatencyRange = "250".parse().unwrap();
        assert_eq!(fixed.min(), Duration::from_millis(250));
        assert_eq!(fixed.max(), Duration::from_millis(250));
        assert!("off".parse::<LatencyRange>().unwrap().is_disabled());
        assert!("0".parse::<LatencyRange>().unwrap().is_disabled());
    }

    #[test]
    fn rejects_inverted_and_garbage() {
        assert_eq!(
            "900-100".parse::<LatencyRange>().unwrap_err(),
            LatencyParseError::Inverted { min_ms: 900, max_ms: 100 }
        );
        assert!(matches!(
            "soon".parse::<LatencyRange>(),
            Err(LatencyParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn samples_stay_within_bounds() {
        let range = LatencyRange::from_millis(10, 20).unwrap();
        for _ in 0..100 {
            let d = range.sample();
            assert!(d >= range.min() && d <= range.max());
        }
    }

    #[tokio::test]
    async fn delays_before_delegating() {
        let range = LatencyRange::from_millis(20, 30).unwrap();
        let resolver = SimulatedLatency::new(RuleTableResolver, range);

        let started = Instant::now();
        let record = resolver.resolve("sneeze").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(record.result.contains("common cold"));
    }
}
