use linkforge_core::domain::profile::{Address, RiskLevel, UserRiskProfile};
use linkforge_core::domain::signals::{AssetChange, RawSignal};
use linkforge_core::engine::{evaluate, CycleOutcome, EngineConfig};
use linkforge_core::scoring::normalize::canonicalize;

/// Scores hand-entered readings as if both upstreams had answered.
///
/// Changes are labelled with the configured asset ids in order; extras get
/// positional names.
pub fn evaluate_raw(
    fear_greed: f64,
    changes: &[f64],
    level: RiskLevel,
    config: &EngineConfig,
) -> CycleOutcome {
    let changes = changes
        .iter()
        .enumerate()
        .map(|(i, change)| AssetChange {
            asset: config
                .fetch
                .assets
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("asset{i}")),
            change_24h: *change,
        })
        .collect();

    let readings = canonicalize(RawSignal::live(fear_greed), RawSignal::live(changes));
    evaluate(
        Address::ZERO,
        UserRiskProfile::with_risk_level(level),
        readings,
        &config.thresholds,
    )
}
