use crate::domain::profile::RiskLevel;
use crate::domain::recommendation::{Action, Recommendation};
use crate::domain::signals::CanonicalSignals;
use crate::scoring::risk::compose_risk;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Decision-rule thresholds. Defaults are the on-chain contract values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Risk above this shifts LOW profiles to stable assets.
    pub high_risk: u32,
    /// Volatility above this diversifies.
    pub high_volatility: u32,
    /// Risk below this (with HIGH profile and positive sentiment) increases exposure.
    pub low_risk: u32,
    pub positive_sentiment: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_risk: 70,
            high_volatility: 80,
            low_risk: 30,
            positive_sentiment: 30,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.high_risk <= 100,
            "high_risk threshold must be 0..=100 (got {})",
            self.high_risk
        );
        ensure!(
            self.high_volatility <= 100,
            "high_volatility threshold must be 0..=100 (got {})",
            self.high_volatility
        );
        ensure!(
            self.low_risk <= 100,
            "low_risk threshold must be 0..=100 (got {})",
            self.low_risk
        );
        ensure!(
            (-100..=100).contains(&self.positive_sentiment),
            "positive_sentiment threshold must be -100..=100 (got {})",
            self.positive_sentiment
        );
        Ok(())
    }
}

/// First matching rule wins; HOLD is the unconditional default.
pub fn decide(
    risk_score: u32,
    volatility_score: u32,
    sentiment_score: i32,
    risk_level: RiskLevel,
    thresholds: &Thresholds,
) -> Action {
    if risk_score > thresholds.high_risk && risk_level == RiskLevel::Low {
        Action::ShiftToStable
    } else if volatility_score > thresholds.high_volatility {
        Action::Diversify
    } else if risk_score < thresholds.low_risk
        && risk_level == RiskLevel::High
        && sentiment_score > thresholds.positive_sentiment
    {
        Action::IncreaseExposure
    } else {
        Action::Hold
    }
}

/// Risk composition followed by the decision rule.
pub fn recommend(
    signals: &CanonicalSignals,
    risk_level: RiskLevel,
    thresholds: &Thresholds,
) -> Recommendation {
    let risk_score = compose_risk(signals.sentiment_score, signals.volatility_score);
    let action = decide(
        risk_score,
        signals.volatility_score,
        signals.sentiment_score,
        risk_level,
        thresholds,
    );
    Recommendation::new(risk_score, action)
}
