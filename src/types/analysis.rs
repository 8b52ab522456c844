//! Analysis result data structures

use crate::config::RiskThresholds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Label for the base smurf probability (0-100 scale). The critical
    /// band is reserved for the unified view.
    pub fn from_probability(probability: f64, thresholds: &RiskThresholds) -> Self {
        let score = probability * 100.0;
        if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Label for the unified overall risk score, including the critical band.
    pub fn from_risk_score(score: f64, thresholds: &RiskThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Per-game metrics for the target player, normalized by game length and
/// same-team denominators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFeatures {
    pub match_id: String,
    pub creation_timestamp_ms: i64,
    pub champion_id: i64,
    pub champion_name: String,
    pub duration_minutes: f64,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub kda: f64,
    pub cs_per_minute: f64,
    pub gold_per_minute: f64,
    pub damage_per_minute: f64,
    /// (kills + assists) / team kills
    pub kill_participation: f64,
    /// player damage / team damage
    pub damage_share: f64,
    pub vision_score: f64,
    pub win: bool,
    pub summoner_spell1_id: i64,
    pub summoner_spell2_id: i64,
}

/// An inactivity gap between consecutive matches exceeding the threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: f64,
    /// In [0,1]; saturates at twice the detection threshold
    pub suspicion_level: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub gaps: Vec<GapRecord>,
    /// Sum of suspicion levels over flagged gaps
    pub total_gap_score: f64,
    /// Mean duration of flagged gaps only; zero when none
    pub average_gap_hours: f64,
}

/// A champion with exactly one recorded game in the analyzed window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionFirstTimeRecord {
    pub champion_id: i64,
    pub champion_name: String,
    pub win_rate: f64,
    pub kda: f64,
    pub cs_per_minute: f64,
    pub suspicion_level: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstTimeAnalysis {
    pub champions: Vec<ChampionFirstTimeRecord>,
    /// Mean suspicion over first-time champions; zero when none
    pub overall_performance_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    HighKda,
    PerfectCs,
    DamageCarry,
    VisionControl,
    GoldLead,
    KillPressure,
}

/// Ordered most severe first, so the derived ordering breaks flag-count
/// ties toward the stronger signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Minor,
}

impl Severity {
    /// Contribution to the game's outlier score
    pub fn weight(self) -> f64 {
        match self {
            Severity::Critical => 25.0,
            Severity::High => 15.0,
            Severity::Moderate => 8.0,
            Severity::Minor => 3.0,
        }
    }

    /// Estimated percentile band; not a measured distribution
    pub fn percentile(self) -> f64 {
        match self {
            Severity::Critical => 99.0,
            Severity::High => 95.0,
            Severity::Moderate => 85.0,
            Severity::Minor => 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierFlag {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub severity: Severity,
    pub value: f64,
    pub percentile: f64,
}

/// A single game scored against rank-tier baselines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierGame {
    pub match_id: String,
    pub champion_id: i64,
    pub champion_name: String,
    pub kda: f64,
    pub cs_per_minute: f64,
    pub gold_per_minute: f64,
    pub damage_share: f64,
    /// In [0,100]
    pub outlier_score: f64,
    pub flags: Vec<OutlierFlag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagCount {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub severity: Severity,
    pub count: usize,
}

/// Player-level outlier summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierSummary {
    pub games_analyzed: usize,
    /// Games at or above the qualification cutoff
    pub outlier_games: Vec<OutlierGame>,
    pub outlier_rate: f64,
    /// Mean score of qualifying games; zero when none
    pub average_outlier_score: f64,
    /// Five most frequent (type, severity) combinations
    pub top_flags: Vec<FlagCount>,
    /// >= 5 outlier games with mean score >= 75
    pub consistently_high_performance: bool,
    /// Recent third of games averages >= 15 points above the earliest third
    pub rapid_improvement: bool,
    /// >= 2 champions whose very first recorded game scored >= 70
    pub multi_champion_first_game_expertise: bool,
    /// 1 - normalized stddev of per-game outlier scores
    pub performance_consistency: f64,
}

/// Independent heuristic factor scores, each in [0,1]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScores {
    pub gaps: f64,
    pub champion_performance: f64,
    pub spell_usage: f64,
    pub associations: f64,
}

/// The published analysis. Created by the orchestrator, written once to
/// the cache, then immutable and shared by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub player_identity: crate::types::riot::PlayerIdentity,
    pub factor_scores: FactorScores,
    pub gap_analysis: GapAnalysis,
    pub first_time_analysis: FirstTimeAnalysis,
    pub outlier_summary: OutlierSummary,
    pub smurf_probability: f64,
    pub risk_level: RiskLevel,
    /// 0-100, the unified view's composite
    pub overall_risk_score: f64,
    /// 0-100, driven by sample size and mode
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_probability() {
        let t = RiskThresholds::default();
        assert_eq!(RiskLevel::from_probability(0.1, &t), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.4, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.7, &t), RiskLevel::High);
        // No critical band on the base probability
        assert_eq!(RiskLevel::from_probability(0.95, &t), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_from_risk_score() {
        let t = RiskThresholds::default();
        assert_eq!(RiskLevel::from_risk_score(39.9, &t), RiskLevel::Low);
        assert_eq!(RiskLevel::from_risk_score(40.0, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_risk_score(70.0, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_risk_score(80.0, &t), RiskLevel::Critical);
    }

    #[test]
    fn test_flag_serialization() {
        let flag = OutlierFlag {
            kind: FlagKind::HighKda,
            severity: Severity::Critical,
            value: 9.5,
            percentile: 99.0,
        };
        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains("\"HIGH_KDA\""));
        assert!(json.contains("\"CRITICAL\""));
    }

    #[test]
    fn test_severity_weights() {
        assert_eq!(Severity::Critical.weight(), 25.0);
        assert_eq!(Severity::High.weight(), 15.0);
        assert_eq!(Severity::Moderate.weight(), 8.0);
        assert_eq!(Severity::Minor.weight(), 3.0);
    }
}
