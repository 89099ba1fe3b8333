use crate::abi::{encode_result, to_hex};
use crate::config::Settings;
use crate::consensus::aggregate_readings;
use crate::domain::profile::{Address, UserRiskProfile};
use crate::domain::recommendation::Recommendation;
use crate::domain::report::{explain, RecommendationReport};
use crate::domain::signals::SignalReadings;
use crate::error::CycleError;
use crate::ingest::provider::{HttpJsonFetcher, JsonFetcher};
use crate::ingest::{FetchConfig, SignalFetcher};
use crate::profile::rpc::RpcProfileReader;
use crate::profile::{ProfileReader, StaticProfileReader};
use crate::scoring::decision::{recommend, Thresholds};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub fetch: FetchConfig,
    pub thresholds: Thresholds,
}

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub user: Address,
    pub profile: UserRiskProfile,
    pub readings: SignalReadings,
    pub recommendation: Recommendation,
    /// ABI-encoded result tuple.
    pub encoded: Vec<u8>,
    pub generated_at: DateTime<Utc>,
}

impl CycleOutcome {
    pub fn report(&self) -> RecommendationReport {
        RecommendationReport::new(
            self.user,
            self.profile,
            &self.readings,
            &self.recommendation,
            to_hex(&self.encoded),
            self.generated_at,
        )
    }

    pub fn explain(&self) -> String {
        explain(&self.readings, &self.recommendation)
    }
}

/// Risk, decision and encoding over already-fetched readings. No I/O.
pub fn evaluate(
    user: Address,
    profile: UserRiskProfile,
    readings: SignalReadings,
    thresholds: &Thresholds,
) -> CycleOutcome {
    let recommendation = recommend(&readings.canonical, profile.risk_level, thresholds);
    let encoded = encode_result(&recommendation, &readings.canonical);

    CycleOutcome {
        user,
        profile,
        readings,
        recommendation,
        encoded,
        generated_at: Utc::now(),
    }
}

/// Sequences profile read, signal fetch, scoring and encoding for one cycle.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    signals: SignalFetcher,
    profiles: Arc<dyn ProfileReader>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        http: Arc<dyn JsonFetcher>,
        profiles: Arc<dyn ProfileReader>,
    ) -> Self {
        let signals = SignalFetcher::new(http, config.fetch.clone());
        Self {
            config,
            signals,
            profiles,
        }
    }

    /// Direct HTTP signals; on-chain profiles when `RPC_URL` and
    /// `PROFILE_CONTRACT_ADDRESS` are both set, otherwise a static profile.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = settings.engine_config()?;
        let http = HttpJsonFetcher::new(config.fetch.retry.timeout)?;

        let profiles: Arc<dyn ProfileReader> =
            if settings.rpc_url.is_some() && settings.profile_contract_address.is_some() {
                let rpc_url = settings.require_rpc_url()?;
                let contract = settings.require_profile_contract()?;
                Arc::new(RpcProfileReader::new(rpc_url, contract)?)
            } else {
                let level = settings.default_risk_level()?;
                Arc::new(StaticProfileReader::new(UserRiskProfile::with_risk_level(level)))
            };

        tracing::info!(
            profile_reader = profiles.reader_name(),
            assets = ?config.fetch.assets,
            "engine configured"
        );

        Ok(Self::new(config, Arc::new(http), profiles))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fails only when the profile cannot be read; upstream signal failures fall back.
    pub async fn run_cycle(&self, user: &Address) -> Result<CycleOutcome> {
        let profile = self.read_profile(user).await?;
        Ok(self.run_cycle_with_profile(user, profile).await)
    }

    /// Same as [`Engine::run_cycle`] with a caller-supplied profile.
    pub async fn run_cycle_with_profile(
        &self,
        user: &Address,
        profile: UserRiskProfile,
    ) -> CycleOutcome {
        let readings = self.signals.fetch_aggregated_signals().await;
        let outcome = evaluate(*user, profile, readings, &self.config.thresholds);
        log_summary(&outcome);
        outcome
    }

    /// Runs `nodes` independent fetches concurrently and medians them before deciding.
    pub async fn run_consensus_cycle(&self, user: &Address, nodes: usize) -> Result<CycleOutcome> {
        let profile = self.read_profile(user).await?;
        self.run_consensus_cycle_with_profile(user, profile, nodes).await
    }

    pub async fn run_consensus_cycle_with_profile(
        &self,
        user: &Address,
        profile: UserRiskProfile,
        nodes: usize,
    ) -> Result<CycleOutcome> {
        let per_node = futures::future::join_all(
            (0..nodes).map(|_| self.signals.fetch_aggregated_signals()),
        )
        .await;

        for (node, readings) in per_node.iter().enumerate() {
            tracing::debug!(
                node,
                sentiment = readings.canonical.sentiment_score,
                volatility = readings.canonical.volatility_score,
                "node signals"
            );
        }

        let Some(readings) = aggregate_readings(&per_node) else {
            let err = anyhow::anyhow!("consensus needs at least one node (got {nodes})");
            return Err(CycleError::new("consensus", *user, &err).into());
        };

        let outcome = evaluate(*user, profile, readings, &self.config.thresholds);
        log_summary(&outcome);
        Ok(outcome)
    }

    async fn read_profile(&self, user: &Address) -> Result<UserRiskProfile> {
        self.profiles.read_user_profile(user).await.map_err(|err| {
            tracing::error!(%user, reader = self.profiles.reader_name(), error = %err, "profile read failed");
            CycleError::new("profile", *user, &err).into()
        })
    }
}

fn log_summary(outcome: &CycleOutcome) {
    tracing::info!(
        user = %outcome.user,
        risk_level = %outcome.profile.risk_level,
        sentiment = outcome.readings.canonical.sentiment_score,
        volatility = outcome.readings.canonical.volatility_score,
        action = %outcome.recommendation.action,
        risk_score = outcome.recommendation.risk_score,
        fear_greed_source = outcome.readings.sentiment_source.as_str(),
        market_source = outcome.readings.volatility_source.as_str(),
        "recommendation cycle completed"
    );
}
