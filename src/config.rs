//! Configuration management for the smurf detection pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub riot: RiotConfig,
    pub cache: CacheConfig,
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Upstream Riot API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiotConfig {
    /// Static API token sent in the X-Riot-Token header
    pub api_key: String,
    /// Platform region label (e.g. "euw1"), carried into analysis results
    #[serde(default)]
    pub region: String,
    /// Platform-routed host (summoner, league, mastery endpoints)
    pub platform_base_url: String,
    /// Regionally-routed host (account, match-v5 endpoints)
    pub regional_base_url: String,
    /// Hard global ceiling on outbound requests per second
    #[serde(default = "default_max_rps")]
    pub max_requests_per_second: u32,
    /// Per-request HTTP timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_rps() -> u32 {
    20
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl RiotConfig {
    /// Build a config for a platform region (e.g. "euw1", "na1", "kr"),
    /// deriving the regional routing cluster from the platform.
    pub fn for_region(region: &str, api_key: String) -> Self {
        let cluster = match region {
            "na1" | "br1" | "la1" | "la2" | "oc1" => "americas",
            "kr" | "jp1" => "asia",
            _ => "europe",
        };
        Self {
            api_key,
            region: region.to_string(),
            platform_base_url: format!("https://{region}.api.riotgames.com"),
            regional_base_url: format!("https://{cluster}.api.riotgames.com"),
            max_requests_per_second: default_max_rps(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Tiered cache configuration: memory capacity, disk location, and the
/// fixed per-endpoint TTLs the gateway writes through with.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one JSON document per namespace
    pub dir: String,
    /// Maximum entries held in the memory tier before LRU eviction
    #[serde(default = "default_max_memory_entries")]
    pub max_memory_entries: usize,
    #[serde(default = "default_summoner_ttl_ms")]
    pub summoner_ttl_ms: i64,
    #[serde(default = "default_match_list_ttl_ms")]
    pub match_list_ttl_ms: i64,
    /// Matches never change after completion, so this TTL is long
    #[serde(default = "default_match_detail_ttl_ms")]
    pub match_detail_ttl_ms: i64,
    #[serde(default = "default_mastery_ttl_ms")]
    pub mastery_ttl_ms: i64,
    #[serde(default = "default_league_ttl_ms")]
    pub league_ttl_ms: i64,
}

fn default_max_memory_entries() -> usize {
    2000
}

fn default_summoner_ttl_ms() -> i64 {
    60 * 60 * 1000
}

fn default_match_list_ttl_ms() -> i64 {
    5 * 60 * 1000
}

fn default_match_detail_ttl_ms() -> i64 {
    7 * 24 * 60 * 60 * 1000
}

fn default_mastery_ttl_ms() -> i64 {
    60 * 60 * 1000
}

fn default_league_ttl_ms() -> i64 {
    10 * 60 * 1000
}

impl CacheConfig {
    /// Config rooted at a specific directory, defaults elsewhere
    pub fn with_dir(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            max_memory_entries: default_max_memory_entries(),
            summoner_ttl_ms: default_summoner_ttl_ms(),
            match_list_ttl_ms: default_match_list_ttl_ms(),
            match_detail_ttl_ms: default_match_detail_ttl_ms(),
            mastery_ttl_ms: default_mastery_ttl_ms(),
            league_ttl_ms: default_league_ttl_ms(),
        }
    }
}

/// Detection configuration: every tuned threshold and weight lives here so
/// components can be constructed with overridden values in tests.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Inactivity gaps longer than this many hours are suspicious
    #[serde(default = "default_gap_threshold_hours")]
    pub gap_threshold_hours: f64,
    #[serde(default)]
    pub first_time: FirstTimeThresholds,
    #[serde(default)]
    pub outlier: OutlierConfig,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub risk: RiskThresholds,
}

fn default_gap_threshold_hours() -> f64 {
    168.0
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            gap_threshold_hours: default_gap_threshold_hours(),
            first_time: FirstTimeThresholds::default(),
            outlier: OutlierConfig::default(),
            weights: ScoreWeights::default(),
            risk: RiskThresholds::default(),
        }
    }
}

/// Thresholds for the first-time-champion screen. Suspicion is additive:
/// each satisfied threshold contributes its fixed share.
#[derive(Debug, Clone, Deserialize)]
pub struct FirstTimeThresholds {
    pub win_rate: f64,
    pub kda: f64,
    pub cs_per_minute: f64,
}

impl Default for FirstTimeThresholds {
    fn default() -> Self {
        Self {
            win_rate: 0.7,
            kda: 3.0,
            cs_per_minute: 8.0,
        }
    }
}

/// Outlier detection thresholds. The multipliers apply against the
/// player's rank-tier baseline; damage share, gold and kill participation
/// are absolute cutoffs.
#[derive(Debug, Clone, Deserialize)]
pub struct OutlierConfig {
    /// A game qualifies as an outlier only at or above this score.
    /// Empirically tuned, not derived; kept overridable.
    pub qualification_score: f64,
    /// Tier used when the player is unranked or the league lookup fails
    pub default_tier: String,
    pub kda_high_mult: f64,
    pub kda_critical_mult: f64,
    pub cs_high_mult: f64,
    pub cs_critical_mult: f64,
    pub damage_share_high: f64,
    pub damage_share_critical: f64,
    pub vision_moderate_mult: f64,
    pub vision_high_mult: f64,
    pub gold_per_min_moderate: f64,
    pub gold_per_min_high: f64,
    pub kill_participation_moderate: f64,
    pub kill_participation_high: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            qualification_score: 60.0,
            default_tier: "GOLD".to_string(),
            kda_high_mult: 2.0,
            kda_critical_mult: 3.0,
            cs_high_mult: 1.3,
            cs_critical_mult: 1.5,
            damage_share_high: 0.35,
            damage_share_critical: 0.45,
            vision_moderate_mult: 1.5,
            vision_high_mult: 2.0,
            gold_per_min_moderate: 450.0,
            gold_per_min_high: 550.0,
            kill_participation_moderate: 0.8,
            kill_participation_high: 0.9,
        }
    }
}

/// Factor weights for the final smurf probability
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreWeights {
    pub champion_performance: f64,
    pub spell_usage: f64,
    pub gaps: f64,
    pub associations: f64,
    /// Intentional boost so moderate evidence still crosses reporting
    /// thresholds. Empirically tuned, not derived.
    pub boost: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            champion_performance: 0.75,
            spell_usage: 0.05,
            gaps: 0.15,
            associations: 0.05,
            boost: 1.2,
        }
    }
}

/// Risk label thresholds on the 0-100 scale. The critical band applies
/// only to the unified overall risk score.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 40.0,
            high: 70.0,
            critical: 80.0,
        }
    }
}

/// Orchestration configuration: match caps, batch sizing and result TTLs
/// for the two latency/accuracy modes.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub fast_match_cap: usize,
    pub normal_match_cap: usize,
    pub fast_batch_size: usize,
    pub fast_batch_pause_ms: u64,
    pub normal_batch_size: usize,
    pub fast_result_ttl_ms: i64,
    pub normal_result_ttl_ms: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fast_match_cap: 50,
            normal_match_cap: 200,
            fast_batch_size: 5,
            fast_batch_pause_ms: 200,
            normal_batch_size: 20,
            fast_result_ttl_ms: 15 * 60 * 1000,
            normal_result_ttl_ms: 30 * 60 * 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            riot: RiotConfig::for_region("euw1", String::new()),
            cache: CacheConfig::with_dir("cache"),
            detection: DetectionConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
