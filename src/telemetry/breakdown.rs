use std::fmt::Display;

use serde::Serialize;

const EXCELLENT_BELOW_MS: u64 = 100;
const GOOD_BELOW_MS: u64 = 500;

/// Latency samples grouped into the three buckets shown by the stats view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyBreakdown {
    /// Samples under 100 ms.
    pub excellent: usize,
    /// Samples from 100 ms up to (not including) 500 ms.
    pub good: usize,
    /// Samples of 500 ms or more.
    pub slow: usize,
}

impl LatencyBreakdown {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a u64>) -> Self {
        samples.into_iter().fold(Self::default(), |mut acc, sample| {
            match *sample {
                s if s < EXCELLENT_BELOW_MS => acc.excellent += 1,
                s if s < GOOD_BELOW_MS => acc.good += 1,
                _ => acc.slow += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.slow
    }
}

impl Display for LatencyBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} excellent (<{}ms), {} good ({}-{}ms), {} slow (>={}ms)",
            self.excellent,
            EXCELLENT_BELOW_MS,
            self.good,
            EXCELLENT_BELOW_MS,
            GOOD_BELOW_MS - 1,
            self.slow,
            GOOD_BELOW_MS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        let breakdown = LatencyBreakdown::from_samples(&[0, 99, 100, 499, 500, 2_000]);
        assert_eq!(
            breakdown,
            LatencyBreakdown {
                excellent: 2,
                good: 2,
                slow: 2
            }
        );
        assert_eq!(breakdown.total(), 6);
    }

    #[test]
    fn test_labels_match_bucket_boundaries() {
        let breakdown = LatencyBreakdown::from_samples(&[99, 100, 499, 500]);
        assert_eq!(
            breakdown.to_string(),
            "1 excellent (<100ms), 2 good (100-499ms), 1 slow (>=500ms)"
        );
    }
}
