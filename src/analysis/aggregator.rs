//! Multi-factor score aggregation.
//!
//! Combines the independent heuristic factors into the final smurf
//! probability, its risk label, and the unified 0-100 overall risk score.

use crate::config::{RiskThresholds, ScoreWeights};
use crate::types::analysis::{FactorScores, RiskLevel};

pub struct ScoreAggregator {
    weights: ScoreWeights,
    risk: RiskThresholds,
}

impl ScoreAggregator {
    pub fn new(weights: ScoreWeights, risk: RiskThresholds) -> Self {
        Self { weights, risk }
    }

    /// Weighted factor sum, boosted, then clamped to [0,1]. Factors are
    /// clamped individually first so an out-of-range input cannot leak
    /// through the boost.
    pub fn smurf_probability(&self, factors: &FactorScores) -> f64 {
        let w = &self.weights;
        let raw = factors.champion_performance.clamp(0.0, 1.0) * w.champion_performance
            + factors.spell_usage.clamp(0.0, 1.0) * w.spell_usage
            + factors.gaps.clamp(0.0, 1.0) * w.gaps
            + factors.associations.clamp(0.0, 1.0) * w.associations;
        (raw * w.boost).clamp(0.0, 1.0)
    }

    /// Risk label for the base probability (no critical band)
    pub fn probability_label(&self, probability: f64) -> RiskLevel {
        RiskLevel::from_probability(probability, &self.risk)
    }

    /// Unified 0-100 composite: label bonus, outlier volume, and a
    /// low-consistency penalty, capped at 100.
    pub fn overall_risk_score(
        &self,
        label: RiskLevel,
        outlier_game_count: usize,
        performance_consistency: f64,
    ) -> f64 {
        let mut score = match label {
            RiskLevel::High | RiskLevel::Critical => 40.0,
            RiskLevel::Medium => 25.0,
            RiskLevel::Low => 10.0,
        };
        score += (outlier_game_count as f64 * 3.0).min(30.0);
        if performance_consistency < 0.3 {
            score += 20.0;
        }
        score.min(100.0)
    }

    /// Risk label for the unified view, including the critical band
    pub fn unified_risk_level(&self, overall_risk_score: f64) -> RiskLevel {
        RiskLevel::from_risk_score(overall_risk_score, &self.risk)
    }
}

/// Confidence in [0,100] driven by sample size and mode: a full 50-game
/// window earns 80, normal mode adds 20.
pub fn confidence(games_analyzed: usize, fast_mode: bool) -> f64 {
    let sample = (games_analyzed as f64 / 50.0).min(1.0) * 80.0;
    let mode_bonus = if fast_mode { 0.0 } else { 20.0 };
    (sample + mode_bonus).clamp(0.0, 100.0)
}
