//! Ties fetch, extraction, scoring and result caching together.
//!
//! The orchestrator resolves the player, pulls their match history
//! through the rate-limited gateway in bounded batches, runs the pure
//! analyzers over the valid match set, and publishes the assembled
//! result to the cache. Individual match-detail failures are dropped
//! rather than aborting the batch; only identity resolution and an empty
//! valid set are fatal.

use crate::analysis::aggregator::{confidence, ScoreAggregator};
use crate::analysis::features::FeatureExtractor;
use crate::analysis::first_time::ChampionFirstTimeAnalyzer;
use crate::analysis::gaps::GapAnalyzer;
use crate::analysis::outliers::OutlierGameDetector;
use crate::analysis::spells::SpellUsageAnalyzer;
use crate::cache::TieredCache;
use crate::config::{AppConfig, PipelineConfig};
use crate::error::{DetectorError, Result};
use crate::gateway::RateLimitedGateway;
use crate::metrics::PipelineMetrics;
use crate::types::analysis::{AnalysisResult, FactorScores};
use crate::types::riot::{MatchRecord, PlayerIdentity};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const ANALYSES_NAMESPACE: &str = "analyses";
const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";
/// Puuids are 78 characters; anything shorter is treated as a legacy
/// summoner name.
const MIN_PUUID_LEN: usize = 40;

/// Caller options for a unified analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Display region override; defaults to the configured platform
    pub region: Option<String>,
    /// Requested match window, capped by mode (50 fast / 200 normal)
    pub match_count: Option<usize>,
    /// Smaller window and batches, favors responsiveness over confidence
    pub fast_mode: bool,
    /// Bypass cached identity and results
    pub force_refresh: bool,
    /// "game#tag"; takes precedence over the positional target
    pub riot_id: Option<String>,
}

/// Coordinates fetch batching, analysis and result caching.
/// All collaborators are injected; the orchestrator owns no globals.
pub struct AnalysisOrchestrator {
    gateway: Arc<RateLimitedGateway>,
    cache: Arc<TieredCache>,
    metrics: Arc<PipelineMetrics>,
    pipeline: PipelineConfig,
    default_region: String,
    default_tier: String,
    extractor: FeatureExtractor,
    gaps: GapAnalyzer,
    first_time: ChampionFirstTimeAnalyzer,
    outliers: OutlierGameDetector,
    spells: SpellUsageAnalyzer,
    aggregator: ScoreAggregator,
}

impl AnalysisOrchestrator {
    pub fn new(
        gateway: Arc<RateLimitedGateway>,
        cache: Arc<TieredCache>,
        config: &AppConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let d = &config.detection;
        Self {
            gateway,
            cache,
            metrics,
            pipeline: config.pipeline.clone(),
            default_region: config.riot.region.clone(),
            default_tier: d.outlier.default_tier.clone(),
            extractor: FeatureExtractor::new(),
            gaps: GapAnalyzer::new(d.gap_threshold_hours),
            first_time: ChampionFirstTimeAnalyzer::new(d.first_time.clone()),
            outliers: OutlierGameDetector::new(d.outlier.clone()),
            spells: SpellUsageAnalyzer::new(),
            aggregator: ScoreAggregator::new(d.weights.clone(), d.risk.clone()),
        }
    }

    /// Entry point consumed by route handlers. `target` is a puuid or a
    /// legacy summoner name; `options.riot_id` takes precedence.
    pub async fn get_unified_analysis(
        &self,
        target: &str,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult> {
        if target.trim().is_empty() && options.riot_id.is_none() {
            return Err(DetectorError::Validation(
                "summoner name or Riot ID required".to_string(),
            ));
        }

        let use_cache = !options.force_refresh;
        let identity = self.resolve_identity(target, options, use_cache).await?;

        let cap = if options.fast_mode {
            self.pipeline.fast_match_cap
        } else {
            self.pipeline.normal_match_cap
        };
        let requested = options.match_count.unwrap_or(cap).min(cap).max(1);

        let result_key = format!("{}:{}", identity.puuid, requested);
        if use_cache {
            if let Some(value) = self.cache.get(ANALYSES_NAMESPACE, &result_key).await {
                match serde_json::from_value::<AnalysisResult>(value) {
                    Ok(result) => {
                        info!(puuid = %identity.puuid, "returning cached analysis");
                        return Ok(result);
                    }
                    Err(e) => warn!(error = %e, "cached analysis unreadable, recomputing"),
                }
            }
        }

        let started = Instant::now();

        let ids = self
            .gateway
            .match_ids(&identity.puuid, requested, None, use_cache)
            .await?;
        debug!(puuid = %identity.puuid, count = ids.len(), "fetched match id list");

        let records = self.fetch_details(&ids, options.fast_mode).await;
        let tier = self.resolve_tier(&identity.puuid).await;

        let result =
            self.analyze_match_set(identity, &records, &tier, options.fast_mode)?;

        let ttl = if options.fast_mode {
            self.pipeline.fast_result_ttl_ms
        } else {
            self.pipeline.normal_result_ttl_ms
        };
        match serde_json::to_value(&result) {
            Ok(value) => {
                self.cache
                    .set(ANALYSES_NAMESPACE, &result_key, value, ttl)
                    .await;
            }
            Err(e) => warn!(error = %e, "failed to serialize analysis for caching"),
        }

        self.metrics
            .record_analysis(started.elapsed(), &format!("{:?}", result.risk_level));
        info!(
            puuid = %result.player_identity.puuid,
            games = result.outlier_summary.games_analyzed,
            smurf_probability = result.smurf_probability,
            risk_level = ?result.risk_level,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(result)
    }

    async fn resolve_identity(
        &self,
        target: &str,
        options: &AnalysisOptions,
        use_cache: bool,
    ) -> Result<PlayerIdentity> {
        let region = options
            .region
            .clone()
            .unwrap_or_else(|| self.default_region.clone());

        if let Some(riot_id) = &options.riot_id {
            let (game_name, tag_line) = riot_id.split_once('#').ok_or_else(|| {
                DetectorError::Validation("Riot ID must be in game#tag form".to_string())
            })?;
            let account = self
                .gateway
                .account_by_riot_id(game_name, tag_line, use_cache)
                .await?;
            let summoner = self
                .gateway
                .summoner_by_puuid(&account.puuid, use_cache)
                .await?;
            return Ok(PlayerIdentity {
                puuid: account.puuid,
                display_name: if account.game_name.is_empty() {
                    summoner.name
                } else {
                    account.game_name
                },
                tag_line: account.tag_line,
                account_level: summoner.summoner_level,
                region,
            });
        }

        if target.len() >= MIN_PUUID_LEN {
            let summoner = self.gateway.summoner_by_puuid(target, use_cache).await?;
            return Ok(PlayerIdentity {
                puuid: target.to_string(),
                display_name: summoner.name,
                tag_line: String::new(),
                account_level: summoner.summoner_level,
                region,
            });
        }

        // Legacy name lookup
        let summoner = self.gateway.summoner_by_name(target, use_cache).await?;
        Ok(PlayerIdentity {
            puuid: summoner.puuid,
            display_name: summoner.name,
            tag_line: String::new(),
            account_level: summoner.summoner_level,
            region,
        })
    }

    /// Fetch match details in bounded batches. Fast mode uses small
    /// batches with a pause between them; normal mode fires larger
    /// batches gated only by the gateway's rate limiter. Failures are
    /// logged and dropped - partial data is acceptable.
    async fn fetch_details(&self, ids: &[String], fast_mode: bool) -> Vec<MatchRecord> {
        let batch_size = if fast_mode {
            self.pipeline.fast_batch_size
        } else {
            self.pipeline.normal_batch_size
        }
        .max(1);

        let mut records = Vec::with_capacity(ids.len());
        let mut chunks = ids.chunks(batch_size).peekable();
        while let Some(chunk) = chunks.next() {
            let fetched = join_all(chunk.iter().map(|id| self.gateway.match_detail(id))).await;
            for (id, result) in chunk.iter().zip(fetched) {
                match result {
                    Ok(dto) => records.push(MatchRecord::from(dto)),
                    Err(e) => {
                        self.metrics.record_detail_failure();
                        warn!(match_id = %id, error = %e, "dropping failed match detail");
                    }
                }
            }
            if fast_mode && chunks.peek().is_some() {
                tokio::time::sleep(Duration::from_millis(self.pipeline.fast_batch_pause_ms)).await;
            }
        }
        records
    }

    /// Best-effort ranked-solo tier lookup; failures fall back to the
    /// configured default tier.
    async fn resolve_tier(&self, puuid: &str) -> String {
        match self.gateway.league_entries(puuid).await {
            Ok(entries) => entries
                .iter()
                .find(|e| e.queue_type == RANKED_SOLO_QUEUE)
                .map(|e| e.tier.clone())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.default_tier.clone()),
            Err(e) => {
                warn!(puuid = %puuid, error = %e, "league lookup failed, using default tier");
                self.default_tier.clone()
            }
        }
    }

    /// Run the pure analysis passes over an already-fetched match set.
    /// An empty valid set is a hard failure.
    pub fn analyze_match_set(
        &self,
        identity: PlayerIdentity,
        records: &[MatchRecord],
        tier: &str,
        fast_mode: bool,
    ) -> Result<AnalysisResult> {
        if records.is_empty() {
            return Err(DetectorError::InsufficientData(
                "No matches found".to_string(),
            ));
        }

        let features = self.extractor.extract_all(records, &identity.puuid);
        if features.is_empty() {
            return Err(DetectorError::InsufficientData(
                "No matches found".to_string(),
            ));
        }

        let gap_analysis = self.gaps.analyze(records);
        let first_time_analysis = self.first_time.analyze(&features);
        let outlier_summary = self.outliers.analyze(&features, tier);
        let spell_usage = self.spells.analyze(&features);

        let factor_scores = FactorScores {
            gaps: gap_analysis.total_gap_score.min(1.0),
            champion_performance: first_time_analysis.overall_performance_score,
            spell_usage,
            // Requires cross-account data the core never fetches
            associations: 0.0,
        };

        let smurf_probability = self.aggregator.smurf_probability(&factor_scores);
        let label = self.aggregator.probability_label(smurf_probability);
        let overall_risk_score = self.aggregator.overall_risk_score(
            label,
            outlier_summary.outlier_games.len(),
            outlier_summary.performance_consistency,
        );
        let risk_level = self.aggregator.unified_risk_level(overall_risk_score);
        let confidence = confidence(features.len(), fast_mode);

        Ok(AnalysisResult {
            player_identity: identity,
            factor_scores,
            gap_analysis,
            first_time_analysis,
            outlier_summary,
            smurf_probability,
            risk_level,
            overall_risk_score,
            confidence,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, RiotConfig};
    use crate::types::riot::ParticipantStat;

    fn orchestrator(dir: &std::path::Path) -> AnalysisOrchestrator {
        let mut config = AppConfig::default();
        config.riot = RiotConfig::for_region("euw1", "test-key".to_string());
        config.cache.dir = dir.to_string_lossy().into_owned();

        let cache = Arc::new(TieredCache::new(dir, config.cache.max_memory_entries));
        let metrics = Arc::new(PipelineMetrics::new());
        let gateway = Arc::new(
            RateLimitedGateway::new(
                config.riot.clone(),
                config.cache.clone(),
                cache.clone(),
                metrics.clone(),
            )
            .expect("gateway"),
        );
        AnalysisOrchestrator::new(gateway, cache, &config, metrics)
    }

    fn identity() -> PlayerIdentity {
        PlayerIdentity {
            puuid: "p".repeat(78),
            display_name: "Tester".to_string(),
            tag_line: "EUW".to_string(),
            account_level: 34,
            region: "euw1".to_string(),
        }
    }

    fn record(ms: i64, puuid: &str) -> MatchRecord {
        MatchRecord {
            match_id: format!("EUW1_{ms}"),
            creation_timestamp_ms: ms,
            duration_seconds: 1800,
            queue_id: 420,
            participants: vec![ParticipantStat {
                puuid: puuid.to_string(),
                champion_id: 1,
                champion_name: "Annie".to_string(),
                team_id: 100,
                kills: 8,
                deaths: 2,
                assists: 6,
                total_cs: 200,
                gold_earned: 11_000,
                total_damage_dealt_to_champions: 18_000,
                vision_score: 22.0,
                win: true,
                role: "MIDDLE".to_string(),
                summoner_spell1_id: 4,
                summoner_spell2_id: 12,
            }],
        }
    }

    #[tokio::test]
    async fn test_empty_match_set_is_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let err = orch
            .analyze_match_set(identity(), &[], "GOLD", false)
            .unwrap_err();
        assert!(matches!(err, DetectorError::InsufficientData(_)));
        assert_eq!(err.to_string(), "No matches found");
    }

    #[tokio::test]
    async fn test_player_absent_from_all_matches_is_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let records = vec![record(1_700_000_000_000, "someone-else")];
        let err = orch
            .analyze_match_set(identity(), &records, "GOLD", false)
            .unwrap_err();
        assert!(matches!(err, DetectorError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn test_analyze_match_set_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());
        let id = identity();

        let records: Vec<MatchRecord> = (0..5)
            .map(|i| record(1_700_000_000_000 + i * 3_600_000, &id.puuid))
            .collect();
        let result = orch
            .analyze_match_set(id, &records, "GOLD", false)
            .unwrap();

        assert!((0.0..=1.0).contains(&result.smurf_probability));
        assert!((0.0..=100.0).contains(&result.overall_risk_score));
        assert!((0.0..=100.0).contains(&result.confidence));
        assert_eq!(result.outlier_summary.games_analyzed, 5);
        // Same champion every game - no first-time entries
        assert!(result.first_time_analysis.champions.is_empty());
    }

    #[tokio::test]
    async fn test_empty_target_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let err = orch
            .get_unified_analysis("", &AnalysisOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_malformed_riot_id_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let options = AnalysisOptions {
            riot_id: Some("no-separator".to_string()),
            ..Default::default()
        };
        let err = orch
            .get_unified_analysis("ignored", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Validation(_)));
    }
}
