//! Smurf Detection Pipeline Library
//!
//! Ingests a player's competitive match history through a rate-limited,
//! cached Riot API gateway, extracts per-game performance features,
//! compares them against rank-tier benchmarks, and aggregates several
//! independent heuristics into a single smurf probability with a
//! confidence level and supporting evidence.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod orchestrator;
pub mod types;

pub use cache::TieredCache;
pub use config::AppConfig;
pub use error::{DetectorError, Result};
pub use gateway::RateLimitedGateway;
pub use metrics::{MetricsReporter, PipelineMetrics};
pub use orchestrator::{AnalysisOptions, AnalysisOrchestrator};
pub use types::analysis::{AnalysisResult, RiskLevel};
