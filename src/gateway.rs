//! Throttled, cached HTTP facade over the Riot API.
//!
//! Every outbound call passes through one FIFO queue drained by a single
//! task that sleeps `1000 / max_requests_per_second` ms between requests,
//! so the total external call rate is bounded no matter how many logical
//! operations are in flight. Cache hits bypass the queue entirely and
//! consume no rate-limit budget. The gateway never retries; failures
//! propagate with their upstream status so the caller can decide.

use crate::cache::TieredCache;
use crate::config::{CacheConfig, RiotConfig};
use crate::error::{DetectorError, Result};
use crate::metrics::PipelineMetrics;
use crate::types::riot::{
    AccountDto, ChallengerLeagueDto, ChampionMasteryDto, ChampionRotationDto, LeagueEntryDto,
    MatchDto, PlatformStatusDto, SummonerDto,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// One upstream endpoint invocation with its parameters
#[derive(Debug, Clone)]
pub enum Endpoint {
    SummonerByName { name: String },
    SummonerByPuuid { puuid: String },
    AccountByRiotId { game_name: String, tag_line: String },
    MatchIds { puuid: String, count: usize, start_time: Option<i64> },
    MatchDetail { match_id: String },
    ChampionMastery { puuid: String },
    LeagueEntriesByPuuid { puuid: String },
    ChallengerLeague { queue: String },
    ChampionRotation,
    PlatformStatus,
}

impl Endpoint {
    /// Short label used in errors and logs
    pub fn label(&self) -> String {
        match self {
            Self::SummonerByName { name } => format!("summoner/by-name/{name}"),
            Self::SummonerByPuuid { puuid } => format!("summoner/by-puuid/{puuid}"),
            Self::AccountByRiotId { game_name, tag_line } => {
                format!("account/by-riot-id/{game_name}#{tag_line}")
            }
            Self::MatchIds { puuid, .. } => format!("match-ids/{puuid}"),
            Self::MatchDetail { match_id } => format!("match/{match_id}"),
            Self::ChampionMastery { puuid } => format!("mastery/{puuid}"),
            Self::LeagueEntriesByPuuid { puuid } => format!("league-entries/{puuid}"),
            Self::ChallengerLeague { queue } => format!("challenger-league/{queue}"),
            Self::ChampionRotation => "champion-rotation".to_string(),
            Self::PlatformStatus => "platform-status".to_string(),
        }
    }

    fn url(&self, config: &RiotConfig) -> String {
        let platform = &config.platform_base_url;
        let regional = &config.regional_base_url;
        match self {
            Self::SummonerByName { name } => {
                format!("{platform}/lol/summoner/v4/summoners/by-name/{name}")
            }
            Self::SummonerByPuuid { puuid } => {
                format!("{platform}/lol/summoner/v4/summoners/by-puuid/{puuid}")
            }
            Self::AccountByRiotId { game_name, tag_line } => {
                format!("{regional}/riot/account/v1/accounts/by-riot-id/{game_name}/{tag_line}")
            }
            Self::MatchIds { puuid, count, start_time } => {
                let mut url =
                    format!("{regional}/lol/match/v5/matches/by-puuid/{puuid}/ids?count={count}");
                if let Some(start) = start_time {
                    url.push_str(&format!("&startTime={start}"));
                }
                url
            }
            Self::MatchDetail { match_id } => {
                format!("{regional}/lol/match/v5/matches/{match_id}")
            }
            Self::ChampionMastery { puuid } => format!(
                "{platform}/lol/champion-mastery/v4/champion-masteries/by-puuid/{puuid}"
            ),
            Self::LeagueEntriesByPuuid { puuid } => {
                format!("{platform}/lol/league/v4/entries/by-puuid/{puuid}")
            }
            Self::ChallengerLeague { queue } => {
                format!("{platform}/lol/league/v4/challengerleagues/by-queue/{queue}")
            }
            Self::ChampionRotation => {
                format!("{platform}/lol/platform/v3/champion-rotations")
            }
            Self::PlatformStatus => format!("{platform}/lol/status/v4/platform-data"),
        }
    }

    fn namespace(&self) -> &'static str {
        match self {
            Self::SummonerByName { .. } | Self::SummonerByPuuid { .. } | Self::AccountByRiotId { .. } => {
                "summoners"
            }
            Self::MatchIds { .. } => "match_histories",
            Self::MatchDetail { .. } => "match_details",
            Self::ChampionMastery { .. } => "mastery",
            Self::LeagueEntriesByPuuid { .. } | Self::ChallengerLeague { .. } => "league",
            Self::ChampionRotation | Self::PlatformStatus => "platform",
        }
    }

    /// Cache keys are prefixed by lookup kind so endpoints sharing a
    /// namespace never collide.
    fn cache_key(&self) -> String {
        match self {
            Self::SummonerByName { name } => format!("name:{name}"),
            Self::SummonerByPuuid { puuid } => format!("puuid:{puuid}"),
            Self::AccountByRiotId { game_name, tag_line } => {
                format!("riot-id:{game_name}#{tag_line}")
            }
            Self::MatchIds { puuid, count, start_time } => match start_time {
                Some(start) => format!("{puuid}:{count}:{start}"),
                None => format!("{puuid}:{count}"),
            },
            Self::MatchDetail { match_id } => match_id.clone(),
            Self::ChampionMastery { puuid } => puuid.clone(),
            Self::LeagueEntriesByPuuid { puuid } => format!("entries:{puuid}"),
            Self::ChallengerLeague { queue } => format!("challenger:{queue}"),
            Self::ChampionRotation => "rotation".to_string(),
            Self::PlatformStatus => "status".to_string(),
        }
    }

    fn ttl_ms(&self, ttls: &CacheConfig) -> i64 {
        match self {
            Self::SummonerByName { .. } | Self::SummonerByPuuid { .. } | Self::AccountByRiotId { .. } => {
                ttls.summoner_ttl_ms
            }
            Self::MatchIds { .. } => ttls.match_list_ttl_ms,
            Self::MatchDetail { .. } => ttls.match_detail_ttl_ms,
            Self::ChampionMastery { .. } => ttls.mastery_ttl_ms,
            Self::LeagueEntriesByPuuid { .. }
            | Self::ChallengerLeague { .. }
            | Self::ChampionRotation
            | Self::PlatformStatus => ttls.league_ttl_ms,
        }
    }
}

struct QueuedRequest {
    url: String,
    label: String,
    reply: oneshot::Sender<Result<Value>>,
}

/// Rate-limited, cached API gateway. Cheap to clone via `Arc`.
pub struct RateLimitedGateway {
    queue: mpsc::UnboundedSender<QueuedRequest>,
    cache: Arc<TieredCache>,
    config: RiotConfig,
    ttls: CacheConfig,
    metrics: Arc<PipelineMetrics>,
}

impl RateLimitedGateway {
    /// Build the gateway and spawn its drain loop.
    pub fn new(
        config: RiotConfig,
        ttls: CacheConfig,
        cache: Arc<TieredCache>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| DetectorError::UpstreamUnavailable {
                endpoint: "client".to_string(),
                detail: e.to_string(),
            })?;

        let (queue, rx) = mpsc::unbounded_channel();
        let pause = Duration::from_millis(1000 / u64::from(config.max_requests_per_second.max(1)));
        tokio::spawn(Self::drain_loop(
            rx,
            client,
            config.api_key.clone(),
            pause,
            metrics.clone(),
        ));

        Ok(Self {
            queue,
            cache,
            config,
            ttls,
            metrics,
        })
    }

    /// Dequeue one request at a time and pace the next by a fixed pause.
    /// This is the only global serialization point for outbound traffic.
    async fn drain_loop(
        mut rx: mpsc::UnboundedReceiver<QueuedRequest>,
        client: reqwest::Client,
        api_key: String,
        pause: Duration,
        metrics: Arc<PipelineMetrics>,
    ) {
        while let Some(request) = rx.recv().await {
            metrics.record_upstream_request();
            let result = Self::execute(&client, &api_key, &request.url, &request.label).await;
            if request.reply.send(result).is_err() {
                warn!(endpoint = %request.label, "caller dropped before response arrived");
            }
            tokio::time::sleep(pause).await;
        }
        debug!("request queue closed, drain loop exiting");
    }

    async fn execute(
        client: &reqwest::Client,
        api_key: &str,
        url: &str,
        label: &str,
    ) -> Result<Value> {
        let response = client
            .get(url)
            .header("X-Riot-Token", api_key)
            .send()
            .await
            .map_err(|e| DetectorError::UpstreamUnavailable {
                endpoint: label.to_string(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectorError::from_status(status.as_u16(), label));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DetectorError::UpstreamUnavailable {
                endpoint: label.to_string(),
                detail: format!("invalid JSON body: {e}"),
            })
    }

    /// Fetch an endpoint, consulting the cache first when `use_cache` is
    /// set. A cached value that no longer parses is purged and treated as
    /// a miss; only responses that validate into `T` are written through,
    /// with the endpoint's fixed TTL.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint, use_cache: bool) -> Result<T> {
        let namespace = endpoint.namespace();
        let key = endpoint.cache_key();

        if use_cache {
            if let Some(value) = self.cache.get(namespace, &key).await {
                match serde_json::from_value::<T>(value) {
                    Ok(parsed) => {
                        debug!(endpoint = %endpoint.label(), "cache hit, bypassing request queue");
                        self.metrics.record_cache_hit();
                        return Ok(parsed);
                    }
                    Err(e) => {
                        warn!(
                            endpoint = %endpoint.label(),
                            error = %e,
                            "cached payload unreadable, purging and refetching"
                        );
                        self.cache.delete(namespace, &key).await;
                    }
                }
            }
            self.metrics.record_cache_miss();
        }

        let value = self.request(&endpoint).await?;
        let parsed: T =
            serde_json::from_value(value.clone()).map_err(|e| DetectorError::UpstreamUnavailable {
                endpoint: endpoint.label(),
                detail: format!("unexpected payload shape: {e}"),
            })?;

        self.cache
            .set(namespace, &key, value, endpoint.ttl_ms(&self.ttls))
            .await;
        Ok(parsed)
    }

    async fn request(&self, endpoint: &Endpoint) -> Result<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.queue
            .send(QueuedRequest {
                url: endpoint.url(&self.config),
                label: endpoint.label(),
                reply: reply_tx,
            })
            .map_err(|_| DetectorError::UpstreamUnavailable {
                endpoint: endpoint.label(),
                detail: "request queue closed".to_string(),
            })?;

        reply_rx.await.map_err(|_| DetectorError::UpstreamUnavailable {
            endpoint: endpoint.label(),
            detail: "request dropped before completion".to_string(),
        })?
    }

    pub async fn summoner_by_name(&self, name: &str, use_cache: bool) -> Result<SummonerDto> {
        self.fetch(Endpoint::SummonerByName { name: name.to_string() }, use_cache)
            .await
    }

    pub async fn summoner_by_puuid(&self, puuid: &str, use_cache: bool) -> Result<SummonerDto> {
        self.fetch(Endpoint::SummonerByPuuid { puuid: puuid.to_string() }, use_cache)
            .await
    }

    pub async fn account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        use_cache: bool,
    ) -> Result<AccountDto> {
        self.fetch(
            Endpoint::AccountByRiotId {
                game_name: game_name.to_string(),
                tag_line: tag_line.to_string(),
            },
            use_cache,
        )
        .await
    }

    pub async fn match_ids(
        &self,
        puuid: &str,
        count: usize,
        start_time: Option<i64>,
        use_cache: bool,
    ) -> Result<Vec<String>> {
        self.fetch(
            Endpoint::MatchIds {
                puuid: puuid.to_string(),
                count,
                start_time,
            },
            use_cache,
        )
        .await
    }

    pub async fn match_detail(&self, match_id: &str) -> Result<MatchDto> {
        self.fetch(Endpoint::MatchDetail { match_id: match_id.to_string() }, true)
            .await
    }

    pub async fn champion_masteries(&self, puuid: &str) -> Result<Vec<ChampionMasteryDto>> {
        self.fetch(Endpoint::ChampionMastery { puuid: puuid.to_string() }, true)
            .await
    }

    pub async fn league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntryDto>> {
        self.fetch(Endpoint::LeagueEntriesByPuuid { puuid: puuid.to_string() }, true)
            .await
    }

    pub async fn challenger_league(&self, queue: &str) -> Result<ChallengerLeagueDto> {
        self.fetch(Endpoint::ChallengerLeague { queue: queue.to_string() }, true)
            .await
    }

    pub async fn champion_rotation(&self) -> Result<ChampionRotationDto> {
        self.fetch(Endpoint::ChampionRotation, true).await
    }

    pub async fn platform_status(&self) -> Result<PlatformStatusDto> {
        self.fetch(Endpoint::PlatformStatus, true).await
    }
}
