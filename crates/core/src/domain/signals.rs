use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of an upstream reading. Observability only; never an input to the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Live,
    Fallback,
}

impl SignalSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSignal<T> {
    pub value: T,
    pub source: SignalSource,
    pub fetched_at: DateTime<Utc>,
}

impl<T> RawSignal<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            source: SignalSource::Live,
            fetched_at: Utc::now(),
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: SignalSource::Fallback,
            fetched_at: Utc::now(),
        }
    }
}

/// 24h percentage price change of one reference asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetChange {
    pub asset: String,
    pub change_24h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSignals {
    /// Always within -100..=100.
    pub sentiment_score: i32,
    /// Always within 0..=100.
    pub volatility_score: u32,
}

/// Everything one fetch pass produced: raw readings, their provenance and the canonical scores.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalReadings {
    pub fear_greed_index: f64,
    pub changes_24h: Vec<AssetChange>,
    pub sentiment_source: SignalSource,
    pub volatility_source: SignalSource,
    pub canonical: CanonicalSignals,
}
