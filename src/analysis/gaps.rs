//! Suspicious inactivity-gap detection.
//!
//! Accounts bought or shelved for ranked decay show long silent stretches
//! between matches; each flagged gap carries a suspicion that saturates at
//! twice the detection threshold.

use crate::types::analysis::{GapAnalysis, GapRecord};
use crate::types::riot::MatchRecord;
use chrono::{TimeZone, Utc};

const MS_PER_HOUR: f64 = 3_600_000.0;

pub struct GapAnalyzer {
    threshold_hours: f64,
}

impl GapAnalyzer {
    pub fn new(threshold_hours: f64) -> Self {
        Self { threshold_hours }
    }

    /// Walk consecutive match pairs in creation order and flag gaps above
    /// the threshold. Fewer than two matches yields an empty analysis.
    pub fn analyze(&self, matches: &[MatchRecord]) -> GapAnalysis {
        if matches.len() < 2 {
            return GapAnalysis::default();
        }

        let mut timestamps: Vec<i64> = matches.iter().map(|m| m.creation_timestamp_ms).collect();
        timestamps.sort_unstable();

        let mut gaps = Vec::new();
        for pair in timestamps.windows(2) {
            let gap_hours = (pair[1] - pair[0]) as f64 / MS_PER_HOUR;
            if gap_hours > self.threshold_hours {
                gaps.push(GapRecord {
                    start_time: Utc.timestamp_millis_opt(pair[0]).single().unwrap_or_default(),
                    end_time: Utc.timestamp_millis_opt(pair[1]).single().unwrap_or_default(),
                    duration_hours: gap_hours,
                    suspicion_level: self.suspicion_level(gap_hours),
                });
            }
        }

        let total_gap_score = gaps.iter().map(|g| g.suspicion_level).sum();
        let average_gap_hours = if gaps.is_empty() {
            0.0
        } else {
            gaps.iter().map(|g| g.duration_hours).sum::<f64>() / gaps.len() as f64
        };

        GapAnalysis {
            gaps,
            total_gap_score,
            average_gap_hours,
        }
    }

    /// `min(1, hours / (2 * threshold))` - saturates at twice the threshold
    pub fn suspicion_level(&self, gap_hours: f64) -> f64 {
        (gap_hours / (2.0 * self.threshold_hours)).min(1.0)
    }
}
