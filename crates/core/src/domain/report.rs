use crate::domain::profile::{Address, UserRiskProfile};
use crate::domain::recommendation::{Action, Recommendation};
use crate::domain::signals::{SignalReadings, SignalSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON projection of one cycle for HTTP and CLI consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub user: Address,
    pub action: Action,
    pub action_index: u8,
    pub risk_score: u32,
    pub reason: String,
    pub signals: ReportSignals,
    pub sources: ReportSources,
    pub profile: UserRiskProfile,
    pub generated_at: DateTime<Utc>,
    /// 0x-prefixed ABI encoding of the result tuple.
    pub encoded: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSignals {
    pub fear_greed_index: f64,
    pub sentiment_score: i32,
    pub volatility_score: u32,
    #[serde(rename = "changes24h")]
    pub changes_24h: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSources {
    pub fear_greed: SignalSource,
    pub market_data: SignalSource,
}

impl RecommendationReport {
    pub fn new(
        user: Address,
        profile: UserRiskProfile,
        readings: &SignalReadings,
        recommendation: &Recommendation,
        encoded_hex: String,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let changes_24h = readings
            .changes_24h
            .iter()
            .map(|c| (c.asset.clone(), c.change_24h))
            .collect();

        Self {
            user,
            action: recommendation.action,
            action_index: recommendation.action.index(),
            risk_score: recommendation.risk_score,
            reason: recommendation.reason.clone(),
            signals: ReportSignals {
                fear_greed_index: readings.fear_greed_index,
                sentiment_score: readings.canonical.sentiment_score,
                volatility_score: readings.canonical.volatility_score,
                changes_24h,
            },
            sources: ReportSources {
                fear_greed: readings.sentiment_source,
                market_data: readings.volatility_source,
            },
            profile,
            generated_at,
            encoded: encoded_hex,
        }
    }
}

fn band(score: u32) -> &'static str {
    if score > 70 {
        "High"
    } else if score > 40 {
        "Medium"
    } else {
        "Low"
    }
}

/// Multi-line market summary shown next to a recommendation. Display only.
pub fn explain(readings: &SignalReadings, recommendation: &Recommendation) -> String {
    let sentiment = readings.canonical.sentiment_score;
    let volatility = readings.canonical.volatility_score;
    let mood = if sentiment > 0 { "Positive" } else { "Negative" };

    format!(
        "Market Analysis:\n\
         - Sentiment: {mood} ({sentiment})\n\
         - Volatility: {} ({volatility})\n\
         - Risk Level: {} ({})\n\
         \n\
         Recommendation: {}\n\
         Reason: {}",
        band(volatility),
        band(recommendation.risk_score),
        recommendation.risk_score,
        recommendation.action,
        recommendation.reason,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::RiskLevel;
    use crate::domain::signals::{AssetChange, CanonicalSignals};
    use chrono::TimeZone;

    fn readings() -> SignalReadings {
        SignalReadings {
            fear_greed_index: 20.0,
            changes_24h: vec![
                AssetChange {
                    asset: "ethereum".to_string(),
                    change_24h: -3.0,
                },
                AssetChange {
                    asset: "bitcoin".to_string(),
                    change_24h: -4.0,
                },
            ],
            sentiment_source: SignalSource::Live,
            volatility_source: SignalSource::Fallback,
            canonical: CanonicalSignals {
                sentiment_score: -60,
                volatility_score: 70,
            },
        }
    }

    #[test]
    fn report_uses_camel_case_wire_names() {
        let rec = Recommendation::new(66, Action::Hold);
        let generated_at = Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap();
        let report = RecommendationReport::new(
            Address::ZERO,
            UserRiskProfile::with_risk_level(RiskLevel::Low),
            &readings(),
            &rec,
            "0x00".to_string(),
            generated_at,
        );

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["action"], "HOLD");
        assert_eq!(v["actionIndex"], 0);
        assert_eq!(v["riskScore"], 66);
        assert_eq!(v["signals"]["sentimentScore"], -60);
        assert_eq!(v["signals"]["changes24h"]["bitcoin"], -4.0);
        assert_eq!(v["sources"]["fearGreed"], "live");
        assert_eq!(v["sources"]["marketData"], "fallback");
        assert_eq!(v["profile"]["riskLevel"], "LOW");
        assert_eq!(
            v["user"],
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn explain_bands_scores() {
        let rec = Recommendation::new(66, Action::Hold);
        let text = explain(&readings(), &rec);
        assert!(text.contains("- Sentiment: Negative (-60)"));
        assert!(text.contains("- Volatility: Medium (70)"));
        assert!(text.contains("- Risk Level: Medium (66)"));
        assert!(text.contains("Recommendation: HOLD"));
    }
}
