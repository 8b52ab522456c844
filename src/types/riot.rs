//! Typed DTOs for upstream Riot API payloads and the immutable domain
//! records the rest of the pipeline consumes.
//!
//! The gateway validates dynamic JSON into these shapes at its boundary;
//! nothing downstream touches raw `serde_json::Value`.

use serde::{Deserialize, Serialize};

/// account-v1 by-riot-id response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub tag_line: String,
}

/// summoner-v4 response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub puuid: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summoner_level: u32,
}

/// match-v5 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDto {
    pub metadata: MatchMetadataDto,
    pub info: MatchInfoDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadataDto {
    pub match_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfoDto {
    /// Unix milliseconds
    pub game_creation: i64,
    /// Seconds
    pub game_duration: i64,
    #[serde(default)]
    pub queue_id: i64,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub champion_id: i64,
    #[serde(default)]
    pub champion_name: String,
    pub team_id: i64,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    #[serde(default)]
    pub total_minions_killed: u32,
    #[serde(default)]
    pub neutral_minions_killed: u32,
    #[serde(default)]
    pub gold_earned: u32,
    #[serde(default)]
    pub total_damage_dealt_to_champions: u32,
    #[serde(default)]
    pub vision_score: f64,
    pub win: bool,
    #[serde(default)]
    pub team_position: String,
    #[serde(default, alias = "summoner1Id")]
    pub summoner1_id: i64,
    #[serde(default, alias = "summoner2Id")]
    pub summoner2_id: i64,
}

/// champion-mastery-v4 entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionMasteryDto {
    pub champion_id: i64,
    pub champion_level: i64,
    pub champion_points: i64,
}

/// league-v4 entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub league_points: i64,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
}

/// league-v4 challenger league
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengerLeagueDto {
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<ChallengerEntryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengerEntryDto {
    #[serde(default)]
    pub summoner_id: String,
    #[serde(default)]
    pub league_points: i64,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
}

/// platform-v3 champion rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionRotationDto {
    pub free_champion_ids: Vec<i64>,
    #[serde(default)]
    pub free_champion_ids_for_new_players: Vec<i64>,
    #[serde(default)]
    pub max_new_player_level: i64,
}

/// status-v4 platform data (subset)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStatusDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Resolved player identity. Immutable once fetched; re-fetched only on
/// forced refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    pub puuid: String,
    pub display_name: String,
    pub tag_line: String,
    pub account_level: u32,
    pub region: String,
}

/// A completed match, reduced to the fields the analyzers need.
/// Immutable; fetched once and cached with a long TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub match_id: String,
    pub creation_timestamp_ms: i64,
    pub duration_seconds: i64,
    pub queue_id: i64,
    pub participants: Vec<ParticipantStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStat {
    pub puuid: String,
    pub champion_id: i64,
    pub champion_name: String,
    pub team_id: i64,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    /// Lane plus neutral creep score
    pub total_cs: u32,
    pub gold_earned: u32,
    pub total_damage_dealt_to_champions: u32,
    pub vision_score: f64,
    pub win: bool,
    pub role: String,
    pub summoner_spell1_id: i64,
    pub summoner_spell2_id: i64,
}

impl From<ParticipantDto> for ParticipantStat {
    fn from(p: ParticipantDto) -> Self {
        Self {
            puuid: p.puuid,
            champion_id: p.champion_id,
            champion_name: p.champion_name,
            team_id: p.team_id,
            kills: p.kills,
            deaths: p.deaths,
            assists: p.assists,
            total_cs: p.total_minions_killed + p.neutral_minions_killed,
            gold_earned: p.gold_earned,
            total_damage_dealt_to_champions: p.total_damage_dealt_to_champions,
            vision_score: p.vision_score,
            win: p.win,
            role: p.team_position,
            summoner_spell1_id: p.summoner1_id,
            summoner_spell2_id: p.summoner2_id,
        }
    }
}

impl From<MatchDto> for MatchRecord {
    fn from(m: MatchDto) -> Self {
        Self {
            match_id: m.metadata.match_id,
            creation_timestamp_ms: m.info.game_creation,
            duration_seconds: m.info.game_duration,
            queue_id: m.info.queue_id,
            participants: m
                .info
                .participants
                .into_iter()
                .map(ParticipantStat::from)
                .collect(),
        }
    }
}
