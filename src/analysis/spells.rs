//! Summoner-spell placement consistency.
//!
//! Experienced players keep their spell layout (which key holds Flash)
//! fixed across every game; fresh accounts tend to shuffle it while
//! settling in. A near-unanimous ordered spell pair over a meaningful
//! sample is weak evidence of an experienced hand.

use crate::types::analysis::GameFeatures;
use std::collections::HashMap;

/// Minimum games before placement consistency means anything
const MIN_SAMPLE: usize = 10;
/// Dominant-pair share where suspicion starts
const SHARE_FLOOR: f64 = 0.9;

pub struct SpellUsageAnalyzer;

impl SpellUsageAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score in [0,1]: `(share - 0.9) * 10` of the dominant ordered
    /// (spell1, spell2) pair, zero under `MIN_SAMPLE` games.
    pub fn analyze(&self, features: &[GameFeatures]) -> f64 {
        if features.len() < MIN_SAMPLE {
            return 0.0;
        }

        let mut counts: HashMap<(i64, i64), usize> = HashMap::new();
        for game in features {
            *counts
                .entry((game.summoner_spell1_id, game.summoner_spell2_id))
                .or_insert(0) += 1;
        }
        let dominant = counts.values().copied().max().unwrap_or(0);
        let share = dominant as f64 / features.len() as f64;

        if share >= SHARE_FLOOR {
            ((share - SHARE_FLOOR) * 10.0).min(1.0)
        } else {
            0.0
        }
    }
}

impl Default for SpellUsageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(spell1: i64, spell2: i64) -> GameFeatures {
        GameFeatures {
            match_id: "EUW1_1".to_string(),
            creation_timestamp_ms: 0,
            champion_id: 1,
            champion_name: "Annie".to_string(),
            duration_minutes: 30.0,
            kills: 0,
            deaths: 0,
            assists: 0,
            kda: 0.0,
            cs_per_minute: 0.0,
            gold_per_minute: 0.0,
            damage_per_minute: 0.0,
            kill_participation: 0.0,
            damage_share: 0.0,
            vision_score: 0.0,
            win: false,
            summoner_spell1_id: spell1,
            summoner_spell2_id: spell2,
        }
    }

    #[test]
    fn test_small_sample_scores_zero() {
        let games: Vec<_> = (0..9).map(|_| game(4, 12)).collect();
        assert_eq!(SpellUsageAnalyzer::new().analyze(&games), 0.0);
    }

    #[test]
    fn test_perfectly_fixed_layout() {
        let games: Vec<_> = (0..20).map(|_| game(4, 12)).collect();
        let score = SpellUsageAnalyzer::new().analyze(&games);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shuffled_layout_scores_zero() {
        // Ordering matters: flipping the pair counts as a different layout
        let mut games: Vec<_> = (0..10).map(|_| game(4, 12)).collect();
        games.extend((0..10).map(|_| game(12, 4)));
        assert_eq!(SpellUsageAnalyzer::new().analyze(&games), 0.0);
    }

    #[test]
    fn test_partial_dominance() {
        // 19 of 20 games share the layout: share 0.95 -> 0.5
        let mut games: Vec<_> = (0..19).map(|_| game(4, 12)).collect();
        games.push(game(6, 4));
        let score = SpellUsageAnalyzer::new().analyze(&games);
        assert!((score - 0.5).abs() < 1e-9);
    }
}
