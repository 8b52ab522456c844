//! Per-game feature extraction for the target player.
//!
//! All rate metrics are normalized by game length; kill participation and
//! damage share use only same-team participants as the denominator.

use crate::types::analysis::GameFeatures;
use crate::types::riot::MatchRecord;

/// (kills + assists) / max(1, deaths)
pub fn kda(kills: u32, deaths: u32, assists: u32) -> f64 {
    f64::from(kills + assists) / f64::from(deaths.max(1))
}

/// Stateless extractor turning a raw match plus a target puuid into
/// normalized per-game metrics.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract features for the target player, or `None` when the player
    /// did not take part in the match or the match has no duration.
    pub fn extract(&self, record: &MatchRecord, puuid: &str) -> Option<GameFeatures> {
        let player = record.participants.iter().find(|p| p.puuid == puuid)?;
        if record.duration_seconds <= 0 {
            return None;
        }
        let minutes = record.duration_seconds as f64 / 60.0;

        let teammates: Vec<_> = record
            .participants
            .iter()
            .filter(|p| p.team_id == player.team_id)
            .collect();
        let team_kills: u32 = teammates.iter().map(|p| p.kills).sum();
        let team_damage: u64 = teammates
            .iter()
            .map(|p| u64::from(p.total_damage_dealt_to_champions))
            .sum();

        let kill_participation = if team_kills > 0 {
            f64::from(player.kills + player.assists) / f64::from(team_kills)
        } else {
            0.0
        };
        let damage_share = if team_damage > 0 {
            f64::from(player.total_damage_dealt_to_champions) / team_damage as f64
        } else {
            0.0
        };

        Some(GameFeatures {
            match_id: record.match_id.clone(),
            creation_timestamp_ms: record.creation_timestamp_ms,
            champion_id: player.champion_id,
            champion_name: player.champion_name.clone(),
            duration_minutes: minutes,
            kills: player.kills,
            deaths: player.deaths,
            assists: player.assists,
            kda: kda(player.kills, player.deaths, player.assists),
            cs_per_minute: f64::from(player.total_cs) / minutes,
            gold_per_minute: f64::from(player.gold_earned) / minutes,
            damage_per_minute: f64::from(player.total_damage_dealt_to_champions) / minutes,
            kill_participation,
            damage_share,
            vision_score: player.vision_score,
            win: player.win,
            summoner_spell1_id: player.summoner_spell1_id,
            summoner_spell2_id: player.summoner_spell2_id,
        })
    }

    /// Extract features for every match containing the player, ordered by
    /// creation time ascending.
    pub fn extract_all(&self, records: &[MatchRecord], puuid: &str) -> Vec<GameFeatures> {
        let mut features: Vec<GameFeatures> = records
            .iter()
            .filter_map(|r| self.extract(r, puuid))
            .collect();
        features.sort_by_key(|f| f.creation_timestamp_ms);
        features
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::riot::ParticipantStat;

    fn participant(puuid: &str, team_id: i64, kills: u32, deaths: u32, assists: u32) -> ParticipantStat {
        ParticipantStat {
            puuid: puuid.to_string(),
            champion_id: 1,
            champion_name: "Annie".to_string(),
            team_id,
            kills,
            deaths,
            assists,
            total_cs: 240,
            gold_earned: 12_000,
            total_damage_dealt_to_champions: 20_000,
            vision_score: 25.0,
            win: true,
            role: "MIDDLE".to_string(),
            summoner_spell1_id: 4,
            summoner_spell2_id: 12,
        }
    }

    fn record() -> MatchRecord {
        MatchRecord {
            match_id: "EUW1_1".to_string(),
            creation_timestamp_ms: 1_700_000_000_000,
            duration_seconds: 1800, // 30 minutes
            queue_id: 420,
            participants: vec![
                participant("target", 100, 10, 2, 5),
                participant("ally", 100, 5, 3, 10),
                participant("enemy", 200, 3, 8, 2),
            ],
        }
    }

    #[test]
    fn test_kda_guards_zero_deaths() {
        assert_eq!(kda(10, 0, 5), 15.0);
        assert_eq!(kda(6, 3, 3), 3.0);
    }

    #[test]
    fn test_extract_team_denominators() {
        let f = FeatureExtractor::new().extract(&record(), "target").unwrap();

        // Team kills = 15, player K+A = 15
        assert!((f.kill_participation - 1.0).abs() < 1e-9);
        // Two teammates with equal damage
        assert!((f.damage_share - 0.5).abs() < 1e-9);
        assert!((f.cs_per_minute - 8.0).abs() < 1e-9);
        assert!((f.gold_per_minute - 400.0).abs() < 1e-9);
        assert_eq!(f.kda, 7.5);
    }

    #[test]
    fn test_extract_missing_player() {
        assert!(FeatureExtractor::new().extract(&record(), "nobody").is_none());
    }

    #[test]
    fn test_extract_all_sorted_ascending() {
        let mut newer = record();
        newer.match_id = "EUW1_2".to_string();
        newer.creation_timestamp_ms += 3_600_000;

        let features = FeatureExtractor::new().extract_all(&[newer, record()], "target");
        assert_eq!(features.len(), 2);
        assert!(features[0].creation_timestamp_ms < features[1].creation_timestamp_ms);
    }
}
