//! First-time-champion performance screen.
//!
//! Smurfs perform well on champions their account has never played.
//! Champions are grouped with running totals; only champions with exactly
//! one recorded game in the analyzed window are scored.

use crate::config::FirstTimeThresholds;
use crate::types::analysis::{ChampionFirstTimeRecord, FirstTimeAnalysis, GameFeatures};
use std::collections::HashMap;

#[derive(Default)]
struct ChampionTotals {
    champion_name: String,
    games: usize,
    wins: usize,
    kda_sum: f64,
    cs_per_minute_sum: f64,
}

pub struct ChampionFirstTimeAnalyzer {
    thresholds: FirstTimeThresholds,
}

impl ChampionFirstTimeAnalyzer {
    pub fn new(thresholds: FirstTimeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(&self, features: &[GameFeatures]) -> FirstTimeAnalysis {
        let mut by_champion: HashMap<i64, ChampionTotals> = HashMap::new();
        for game in features {
            let totals = by_champion.entry(game.champion_id).or_default();
            totals.champion_name = game.champion_name.clone();
            totals.games += 1;
            if game.win {
                totals.wins += 1;
            }
            totals.kda_sum += game.kda;
            totals.cs_per_minute_sum += game.cs_per_minute;
        }

        let mut champions: Vec<ChampionFirstTimeRecord> = by_champion
            .into_iter()
            .filter(|(_, totals)| totals.games == 1)
            .map(|(champion_id, totals)| {
                let win_rate = totals.wins as f64;
                let kda = totals.kda_sum;
                let cs_per_minute = totals.cs_per_minute_sum;
                ChampionFirstTimeRecord {
                    champion_id,
                    champion_name: totals.champion_name,
                    win_rate,
                    kda,
                    cs_per_minute,
                    suspicion_level: self.suspicion_level(win_rate, kda, cs_per_minute),
                }
            })
            .collect();
        champions.sort_by(|a, b| {
            b.suspicion_level
                .partial_cmp(&a.suspicion_level)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let overall_performance_score = if champions.is_empty() {
            0.0
        } else {
            champions.iter().map(|c| c.suspicion_level).sum::<f64>() / champions.len() as f64
        };

        FirstTimeAnalysis {
            champions,
            overall_performance_score,
        }
    }

    /// Sum of independent boolean thresholds: 0.4 for win rate, 0.3 for
    /// KDA, 0.3 for CS/min. Max 1.0, not a continuous function.
    fn suspicion_level(&self, win_rate: f64, kda: f64, cs_per_minute: f64) -> f64 {
        let mut level = 0.0;
        if win_rate >= self.thresholds.win_rate {
            level += 0.4;
        }
        if kda >= self.thresholds.kda {
            level += 0.3;
        }
        if cs_per_minute >= self.thresholds.cs_per_minute {
            level += 0.3;
        }
        level
    }
}
