//! Statistical outlier detection against rank-tier benchmarks.
//!
//! Each game is scored by how far its metrics exceed the player's tier
//! baseline; severities are weighted into a 0-100 outlier score and the
//! per-player summary derives rate, top flag combinations and three
//! pattern booleans from the scored set.

use crate::config::OutlierConfig;
use crate::types::analysis::{
    FlagCount, FlagKind, GameFeatures, OutlierFlag, OutlierGame, OutlierSummary, Severity,
};
use std::collections::{HashMap, HashSet};

/// Expected performance for an average player of a tier
#[derive(Debug, Clone, Copy)]
pub struct TierBaseline {
    pub kda: f64,
    pub cs_per_min: f64,
    pub damage_share: f64,
    pub vision_score: f64,
}

/// The nine ladder tiers, IRON through CHALLENGER. Unknown or unranked
/// tiers fall back to GOLD; EMERALD maps onto the PLATINUM row.
pub fn baseline_for(tier: &str) -> TierBaseline {
    match tier.to_ascii_uppercase().as_str() {
        "IRON" => TierBaseline { kda: 1.6, cs_per_min: 3.5, damage_share: 0.18, vision_score: 14.0 },
        "BRONZE" => TierBaseline { kda: 1.9, cs_per_min: 4.2, damage_share: 0.19, vision_score: 16.0 },
        "SILVER" => TierBaseline { kda: 2.2, cs_per_min: 4.8, damage_share: 0.20, vision_score: 18.0 },
        "GOLD" => TierBaseline { kda: 2.5, cs_per_min: 5.5, damage_share: 0.21, vision_score: 21.0 },
        "PLATINUM" | "EMERALD" => {
            TierBaseline { kda: 2.8, cs_per_min: 6.2, damage_share: 0.22, vision_score: 24.0 }
        }
        "DIAMOND" => TierBaseline { kda: 3.3, cs_per_min: 7.4, damage_share: 0.24, vision_score: 31.0 },
        "MASTER" => TierBaseline { kda: 3.6, cs_per_min: 7.8, damage_share: 0.25, vision_score: 34.0 },
        "GRANDMASTER" => {
            TierBaseline { kda: 4.0, cs_per_min: 8.2, damage_share: 0.26, vision_score: 38.0 }
        }
        "CHALLENGER" => {
            TierBaseline { kda: 4.5, cs_per_min: 8.5, damage_share: 0.28, vision_score: 42.0 }
        }
        _ => TierBaseline { kda: 2.5, cs_per_min: 5.5, damage_share: 0.21, vision_score: 21.0 },
    }
}

const DEATHLESS_BONUS: f64 = 20.0;
const DEATHLESS_MIN_TAKEDOWNS: u32 = 10;
const MULTI_FLAG_BONUS: f64 = 10.0;
const MULTI_FLAG_MIN_KINDS: usize = 3;

pub struct OutlierGameDetector {
    config: OutlierConfig,
}

impl OutlierGameDetector {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    /// Score a single game against a tier baseline.
    pub fn evaluate_game(&self, game: &GameFeatures, baseline: &TierBaseline) -> OutlierGame {
        let c = &self.config;
        let mut flags = Vec::new();

        if let Some(severity) = grade(
            game.kda,
            baseline.kda * c.kda_critical_mult,
            baseline.kda * c.kda_high_mult,
            Severity::Critical,
            Severity::High,
        ) {
            flags.push(flag(FlagKind::HighKda, severity, game.kda));
        }
        if let Some(severity) = grade(
            game.cs_per_minute,
            baseline.cs_per_min * c.cs_critical_mult,
            baseline.cs_per_min * c.cs_high_mult,
            Severity::Critical,
            Severity::High,
        ) {
            flags.push(flag(FlagKind::PerfectCs, severity, game.cs_per_minute));
        }
        if let Some(severity) = grade(
            game.damage_share,
            c.damage_share_critical,
            c.damage_share_high,
            Severity::Critical,
            Severity::High,
        ) {
            flags.push(flag(FlagKind::DamageCarry, severity, game.damage_share));
        }
        if let Some(severity) = grade(
            game.vision_score,
            baseline.vision_score * c.vision_high_mult,
            baseline.vision_score * c.vision_moderate_mult,
            Severity::High,
            Severity::Moderate,
        ) {
            flags.push(flag(FlagKind::VisionControl, severity, game.vision_score));
        }
        if let Some(severity) = grade(
            game.gold_per_minute,
            c.gold_per_min_high,
            c.gold_per_min_moderate,
            Severity::High,
            Severity::Moderate,
        ) {
            flags.push(flag(FlagKind::GoldLead, severity, game.gold_per_minute));
        }
        if let Some(severity) = grade(
            game.kill_participation,
            c.kill_participation_high,
            c.kill_participation_moderate,
            Severity::High,
            Severity::Moderate,
        ) {
            flags.push(flag(FlagKind::KillPressure, severity, game.kill_participation));
        }

        let mut score: f64 = flags.iter().map(|f| f.severity.weight()).sum();
        if game.deaths == 0 && game.kills + game.assists >= DEATHLESS_MIN_TAKEDOWNS {
            score += DEATHLESS_BONUS;
        }
        let distinct_kinds: HashSet<FlagKind> = flags.iter().map(|f| f.kind).collect();
        if distinct_kinds.len() >= MULTI_FLAG_MIN_KINDS {
            score += MULTI_FLAG_BONUS;
        }

        OutlierGame {
            match_id: game.match_id.clone(),
            champion_id: game.champion_id,
            champion_name: game.champion_name.clone(),
            kda: game.kda,
            cs_per_minute: game.cs_per_minute,
            gold_per_minute: game.gold_per_minute,
            damage_share: game.damage_share,
            outlier_score: score.min(100.0),
            flags,
        }
    }

    /// Score every game and build the player-level summary. Expects games
    /// in chronological order (ascending creation time).
    pub fn analyze(&self, features: &[GameFeatures], tier: &str) -> OutlierSummary {
        let baseline = baseline_for(tier);
        let scored: Vec<OutlierGame> = features
            .iter()
            .map(|game| self.evaluate_game(game, &baseline))
            .collect();

        let scores: Vec<f64> = scored.iter().map(|g| g.outlier_score).collect();
        let performance_consistency = consistency(&scores);

        let mut flag_counts: HashMap<(FlagKind, Severity), usize> = HashMap::new();
        for game in &scored {
            for f in &game.flags {
                *flag_counts.entry((f.kind, f.severity)).or_insert(0) += 1;
            }
        }
        let mut top_flags: Vec<FlagCount> = flag_counts
            .into_iter()
            .map(|((kind, severity), count)| FlagCount { kind, severity, count })
            .collect();
        top_flags.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.severity.cmp(&b.severity))
        });
        top_flags.truncate(5);

        let multi_champion_first_game_expertise = {
            let mut seen = HashSet::new();
            let mut strong_first_games = 0usize;
            for game in &scored {
                if seen.insert(game.champion_id) && game.outlier_score >= 70.0 {
                    strong_first_games += 1;
                }
            }
            strong_first_games >= 2
        };

        let rapid_improvement = {
            let third = scores.len() / 3;
            if third == 0 {
                false
            } else {
                let earliest = mean(&scores[..third]);
                let recent = mean(&scores[scores.len() - third..]);
                recent >= earliest + 15.0
            }
        };

        let outlier_games: Vec<OutlierGame> = scored
            .into_iter()
            .filter(|g| g.outlier_score >= self.config.qualification_score)
            .collect();

        let average_outlier_score = if outlier_games.is_empty() {
            0.0
        } else {
            outlier_games.iter().map(|g| g.outlier_score).sum::<f64>() / outlier_games.len() as f64
        };
        let outlier_rate = if features.is_empty() {
            0.0
        } else {
            outlier_games.len() as f64 / features.len() as f64
        };
        let consistently_high_performance =
            outlier_games.len() >= 5 && average_outlier_score >= 75.0;

        OutlierSummary {
            games_analyzed: features.len(),
            outlier_games,
            outlier_rate,
            average_outlier_score,
            top_flags,
            consistently_high_performance,
            rapid_improvement,
            multi_champion_first_game_expertise,
            performance_consistency,
        }
    }
}

fn flag(kind: FlagKind, severity: Severity, value: f64) -> OutlierFlag {
    OutlierFlag {
        kind,
        severity,
        value,
        percentile: severity.percentile(),
    }
}

fn grade(
    value: f64,
    upper: f64,
    lower: f64,
    upper_severity: Severity,
    lower_severity: Severity,
) -> Option<Severity> {
    if value >= upper {
        Some(upper_severity)
    } else if value >= lower {
        Some(lower_severity)
    } else {
        None
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// 1 - normalized stddev of per-game scores; 1.0 under two games
pub fn consistency(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 1.0;
    }
    let m = mean(scores);
    let variance = scores.iter().map(|s| (s - m).powi(2)).sum::<f64>() / scores.len() as f64;
    1.0 - (variance.sqrt() / 50.0).min(1.0)
}
