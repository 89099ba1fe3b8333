use crate::domain::signals::{AssetChange, CanonicalSignals, SignalReadings, SignalSource};
use std::collections::BTreeMap;

/// Element at index `n / 2` of the sorted values: always an observed value,
/// the upper median when `n` is even.
pub fn median<T: Ord + Copy>(values: &[T]) -> Option<T> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.get(sorted.len() / 2).copied()
}

fn median_f64(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.get(sorted.len() / 2).copied()
}

/// Medians sentiment and volatility independently.
pub fn aggregate_signals(nodes: &[CanonicalSignals]) -> Option<CanonicalSignals> {
    let sentiments: Vec<i32> = nodes.iter().map(|s| s.sentiment_score).collect();
    let volatilities: Vec<u32> = nodes.iter().map(|s| s.volatility_score).collect();

    Some(CanonicalSignals {
        sentiment_score: median(&sentiments)?,
        volatility_score: median(&volatilities)?,
    })
}

fn majority_source(sources: impl Iterator<Item = SignalSource>) -> SignalSource {
    let (live, total) = sources.fold((0usize, 0usize), |(live, total), s| {
        (live + usize::from(s == SignalSource::Live), total + 1)
    });
    if live * 2 > total {
        SignalSource::Live
    } else {
        SignalSource::Fallback
    }
}

/// Combines per-node readings the way the oracle network would.
///
/// Canonical scores and the raw index are medians; per-asset changes are
/// medians over the nodes that reported the asset; a signal is `Live` only
/// when a strict majority of nodes read it live.
pub fn aggregate_readings(nodes: &[SignalReadings]) -> Option<SignalReadings> {
    let canonical: Vec<CanonicalSignals> = nodes.iter().map(|r| r.canonical).collect();
    let canonical = aggregate_signals(&canonical)?;

    let indices: Vec<f64> = nodes.iter().map(|r| r.fear_greed_index).collect();
    let fear_greed_index = median_f64(&indices)?;

    // Preserve the first-seen asset order.
    let mut order: Vec<String> = Vec::new();
    let mut per_asset: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for change in nodes.iter().flat_map(|r| r.changes_24h.iter()) {
        let values = per_asset.entry(change.asset.clone()).or_insert_with(|| {
            order.push(change.asset.clone());
            Vec::new()
        });
        values.push(change.change_24h);
    }
    let changes_24h = order
        .into_iter()
        .filter_map(|asset| {
            let change_24h = median_f64(per_asset.get(&asset)?)?;
            Some(AssetChange { asset, change_24h })
        })
        .collect();

    Some(SignalReadings {
        fear_greed_index,
        changes_24h,
        sentiment_source: majority_source(nodes.iter().map(|r| r.sentiment_source)),
        volatility_source: majority_source(nodes.iter().map(|r| r.volatility_source)),
        canonical,
    })
}
