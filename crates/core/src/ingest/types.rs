use crate::domain::signals::AssetChange;
use serde::Deserialize;
use serde_json::Value;

/// `{ "data": [ { "value": "<0-100>" } ] }`
#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedResponse {
    #[serde(default)]
    pub data: Vec<FearGreedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedEntry {
    #[serde(default)]
    pub value: Option<IndexValue>,
}

/// The index is documented as a string but some mirrors send a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndexValue {
    Text(String),
    Number(f64),
}

impl IndexValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Number(n) => Some(*n),
        }
    }
}

/// Extracts the raw 0..=100 index. `None` means the payload is unusable.
pub fn parse_fear_greed(body: &Value) -> Option<f64> {
    let parsed = serde_json::from_value::<FearGreedResponse>(body.clone()).ok()?;
    let index = parsed.data.first()?.value.as_ref()?.as_f64()?;
    index.is_finite().then_some(index)
}

/// `{ "<assetId>": { "usd_24h_change": <float> }, ... }`
///
/// Assets missing from the response are skipped; an asset present without a
/// numeric change reads as 0. `None` when the body is not an object.
pub fn parse_market_changes(body: &Value, assets: &[String]) -> Option<Vec<AssetChange>> {
    let quotes = body.as_object()?;

    let changes = assets
        .iter()
        .filter_map(|asset| {
            let quote = quotes.get(asset)?;
            let change_24h = quote
                .get("usd_24h_change")
                .and_then(Value::as_f64)
                .filter(|c| c.is_finite())
                .unwrap_or(0.0);
            Some(AssetChange {
                asset: asset.clone(),
                change_24h,
            })
        })
        .collect();

    Some(changes)
}
