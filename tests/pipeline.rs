//! End-to-end pipeline tests against a local canned HTTP server.
//!
//! The stub accepts one request per connection, matches on the path and
//! replies with a fixed JSON body, so the full fetch/analyze/cache path
//! runs without touching the real upstream. Connections are counted to
//! observe cache behavior and rate pacing from the outside.

use serde_json::json;
use smurf_detection_pipeline::config::{AppConfig, CacheConfig, RiotConfig};
use smurf_detection_pipeline::error::DetectorError;
use smurf_detection_pipeline::{
    AnalysisOptions, AnalysisOrchestrator, PipelineMetrics, RateLimitedGateway, TieredCache,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PUUID: &str =
    "test-puuid-0000000000000000000000000000000000000000000000000000000000000000-x";

type Responder = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Spawn a one-request-per-connection HTTP stub. Returns its base URL and
/// a counter of accepted connections.
async fn spawn_stub(respond: Responder) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let respond = respond.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    match stream.read(&mut buf[read..]).await {
                        Ok(0) => break,
                        Ok(n) => {
                            read += n;
                            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                            if read == buf.len() {
                                break;
                            }
                        }
                        Err(_) => return,
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let response = match respond(&path) {
                    Some(body) => format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    ),
                    None => {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string()
                    }
                };
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), hits)
}

fn test_config(base_url: &str, cache_dir: &str, max_rps: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.riot = RiotConfig::for_region("euw1", "test-key".to_string());
    config.riot.platform_base_url = base_url.to_string();
    config.riot.regional_base_url = base_url.to_string();
    config.riot.max_requests_per_second = max_rps;
    config.cache = CacheConfig::with_dir(cache_dir);
    config
}

fn build_pipeline(
    config: &AppConfig,
) -> (AnalysisOrchestrator, Arc<PipelineMetrics>) {
    let metrics = Arc::new(PipelineMetrics::new());
    let cache = Arc::new(TieredCache::new(
        &config.cache.dir,
        config.cache.max_memory_entries,
    ));
    let gateway = Arc::new(
        RateLimitedGateway::new(
            config.riot.clone(),
            config.cache.clone(),
            cache.clone(),
            metrics.clone(),
        )
        .unwrap(),
    );
    let orchestrator = AnalysisOrchestrator::new(gateway, cache, config, metrics.clone());
    (orchestrator, metrics)
}

fn match_body(match_id: &str, creation_ms: i64) -> String {
    json!({
        "metadata": {"matchId": match_id, "participants": [PUUID, "ally", "enemy"]},
        "info": {
            "gameCreation": creation_ms,
            "gameDuration": 1800,
            "queueId": 420,
            "participants": [
                {
                    "puuid": PUUID,
                    "championId": 64,
                    "championName": "LeeSin",
                    "teamId": 100,
                    "kills": 5, "deaths": 4, "assists": 6,
                    "totalMinionsKilled": 140, "neutralMinionsKilled": 20,
                    "goldEarned": 11000,
                    "totalDamageDealtToChampions": 18000,
                    "visionScore": 24.0,
                    "win": true,
                    "teamPosition": "JUNGLE",
                    "summoner1Id": 4, "summoner2Id": 11
                },
                {
                    "puuid": "ally",
                    "championId": 103,
                    "championName": "Ahri",
                    "teamId": 100,
                    "kills": 4, "deaths": 5, "assists": 7,
                    "totalMinionsKilled": 170, "neutralMinionsKilled": 5,
                    "goldEarned": 10500,
                    "totalDamageDealtToChampions": 20000,
                    "visionScore": 20.0,
                    "win": true,
                    "teamPosition": "MIDDLE",
                    "summoner1Id": 4, "summoner2Id": 14
                },
                {
                    "puuid": "enemy",
                    "championId": 22,
                    "championName": "Ashe",
                    "teamId": 200,
                    "kills": 3, "deaths": 6, "assists": 4,
                    "totalMinionsKilled": 160, "neutralMinionsKilled": 0,
                    "goldEarned": 9500,
                    "totalDamageDealtToChampions": 15000,
                    "visionScore": 18.0,
                    "win": false,
                    "teamPosition": "BOTTOM",
                    "summoner1Id": 4, "summoner2Id": 7
                }
            ]
        }
    })
    .to_string()
}

/// Routes for a healthy three-match account
fn full_responder() -> Responder {
    Arc::new(|path: &str| {
        if path.contains("/lol/summoner/v4/summoners/by-puuid/") {
            return Some(
                json!({"puuid": PUUID, "id": "enc", "name": "TestPlayer", "summonerLevel": 120})
                    .to_string(),
            );
        }
        if path.contains("/lol/league/v4/entries/by-puuid/") {
            return Some(
                json!([{
                    "queueType": "RANKED_SOLO_5x5",
                    "tier": "GOLD",
                    "rank": "II",
                    "leaguePoints": 40,
                    "wins": 60,
                    "losses": 55
                }])
                .to_string(),
            );
        }
        if path.contains("/ids") {
            return Some(json!(["EUW1_1", "EUW1_2", "EUW1_3"]).to_string());
        }
        if let Some(id) = path.strip_prefix("/lol/match/v5/matches/") {
            let hour = 60 * 60 * 1000;
            let n: i64 = id.trim_start_matches("EUW1_").parse().unwrap_or(1);
            return Some(match_body(id, 1_700_000_000_000 + n * 5 * hour));
        }
        None
    })
}

#[tokio::test]
async fn test_end_to_end_analysis() {
    let (base, hits) = spawn_stub(full_responder()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, dir.path().to_str().unwrap(), 200);
    let (orchestrator, metrics) = build_pipeline(&config);

    let options = AnalysisOptions {
        match_count: Some(3),
        ..Default::default()
    };
    let result = orchestrator.get_unified_analysis(PUUID, &options).await.unwrap();

    assert_eq!(result.player_identity.puuid, PUUID);
    assert_eq!(result.player_identity.display_name, "TestPlayer");
    assert_eq!(result.outlier_summary.games_analyzed, 3);
    assert!((0.0..=1.0).contains(&result.smurf_probability));
    assert!((0.0..=100.0).contains(&result.overall_risk_score));
    // Normal mode: 3/50 * 80 + 20
    assert!((result.confidence - 24.8).abs() < 1e-9);

    // summoner + match ids + 3 details + league entries
    assert_eq!(hits.load(Ordering::SeqCst), 6);
    assert_eq!(metrics.analyses_completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repeat_analysis_served_from_cache() {
    let (base, hits) = spawn_stub(full_responder()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, dir.path().to_str().unwrap(), 200);
    let (orchestrator, _metrics) = build_pipeline(&config);

    let options = AnalysisOptions {
        match_count: Some(3),
        ..Default::default()
    };
    let first = orchestrator.get_unified_analysis(PUUID, &options).await.unwrap();
    let after_first = hits.load(Ordering::SeqCst);

    let second = orchestrator.get_unified_analysis(PUUID, &options).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), after_first);
    assert_eq!(second.smurf_probability, first.smurf_probability);
    assert_eq!(second.generated_at, first.generated_at);
}

#[tokio::test]
async fn test_force_refresh_bypasses_cached_result() {
    let (base, hits) = spawn_stub(full_responder()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, dir.path().to_str().unwrap(), 200);
    let (orchestrator, _metrics) = build_pipeline(&config);

    let options = AnalysisOptions {
        match_count: Some(3),
        ..Default::default()
    };
    orchestrator.get_unified_analysis(PUUID, &options).await.unwrap();
    let after_first = hits.load(Ordering::SeqCst);

    let refresh = AnalysisOptions {
        match_count: Some(3),
        force_refresh: true,
        ..Default::default()
    };
    let result = orchestrator.get_unified_analysis(PUUID, &refresh).await.unwrap();

    // Identity and match list are re-fetched; immutable match details
    // still come from the cache.
    assert_eq!(hits.load(Ordering::SeqCst), after_first + 2);
    assert_eq!(result.outlier_summary.games_analyzed, 3);
}

#[tokio::test]
async fn test_request_pacing_bounds_upstream_rate() {
    let (base, hits) = spawn_stub(full_responder()).await;
    let dir = tempfile::tempdir().unwrap();
    // 10 rps -> 100ms pause after every drained request
    let config = test_config(&base, dir.path().to_str().unwrap(), 10);

    let metrics = Arc::new(PipelineMetrics::new());
    let cache = Arc::new(TieredCache::new(&config.cache.dir, 64));
    let gateway = RateLimitedGateway::new(
        config.riot.clone(),
        config.cache.clone(),
        cache,
        metrics,
    )
    .unwrap();

    let started = Instant::now();
    let ids = ["EUW1_1", "EUW1_2", "EUW1_3", "EUW1_4", "EUW1_5"];
    let fetches = ids.iter().map(|id| gateway.match_detail(id));
    let results = futures::future::join_all(fetches).await;
    let elapsed = started.elapsed();

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(hits.load(Ordering::SeqCst), 5);
    // Five queued requests pass four inter-request pauses
    assert!(
        elapsed >= Duration::from_millis(380),
        "drained too fast: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_unreadable_cached_payload_purged_and_refetched() {
    let (base, hits) = spawn_stub(full_responder()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, dir.path().to_str().unwrap(), 200);

    let metrics = Arc::new(PipelineMetrics::new());
    let cache = Arc::new(TieredCache::new(&config.cache.dir, 64));
    let gateway = RateLimitedGateway::new(
        config.riot.clone(),
        config.cache.clone(),
        cache.clone(),
        metrics,
    )
    .unwrap();

    // Seed the key with a payload that no longer parses as a summoner
    cache
        .set("summoners", &format!("puuid:{PUUID}"), json!("garbage"), 60_000)
        .await;

    let summoner = gateway.summoner_by_puuid(PUUID, true).await.unwrap();
    assert_eq!(summoner.name, "TestPlayer");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // The refetched payload replaced the bad entry
    let summoner = gateway.summoner_by_puuid(PUUID, true).await.unwrap();
    assert_eq!(summoner.name, "TestPlayer");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_response_is_not_cached() {
    let (base, hits) =
        spawn_stub(Arc::new(|_: &str| Some(json!("not-a-summoner").to_string()))).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, dir.path().to_str().unwrap(), 200);

    let metrics = Arc::new(PipelineMetrics::new());
    let cache = Arc::new(TieredCache::new(&config.cache.dir, 64));
    let gateway = RateLimitedGateway::new(
        config.riot.clone(),
        config.cache.clone(),
        cache.clone(),
        metrics,
    )
    .unwrap();

    let err = gateway.summoner_by_puuid(PUUID, true).await.unwrap_err();
    assert!(matches!(err, DetectorError::UpstreamUnavailable { .. }));
    assert!(cache.get("summoners", &format!("puuid:{PUUID}")).await.is_none());

    // The next call goes upstream again instead of replaying the bad payload
    gateway.summoner_by_puuid(PUUID, true).await.unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unknown_player_maps_to_not_found() {
    let (base, _hits) = spawn_stub(Arc::new(|_: &str| None)).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base, dir.path().to_str().unwrap(), 200);
    let (orchestrator, _metrics) = build_pipeline(&config);

    let err = orchestrator
        .get_unified_analysis(PUUID, &AnalysisOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DetectorError::NotFound { .. }));
    assert_eq!(err.http_status(), 404);
}
