use crate::domain::signals::{AssetChange, CanonicalSignals, RawSignal, SignalReadings, SignalSource};

/// Neutral fear/greed index, used when the sentiment upstream is unavailable.
pub const NEUTRAL_FEAR_GREED: f64 = 50.0;

/// Volatility score used when no reference asset produced a reading.
pub const FALLBACK_VOLATILITY: u32 = 50;

// A 5% average absolute move maps to the top of the scale.
const VOLATILITY_SCALE: f64 = 20.0;

// All rounding below is `f64::round` (half away from zero) so that
// independent executions agree on the integer outputs.

/// Maps a 0..=100 fear/greed index onto -100..=100.
pub fn normalize_sentiment(raw_index: f64) -> i32 {
    let raw_index = if raw_index.is_finite() {
        raw_index
    } else {
        NEUTRAL_FEAR_GREED
    };

    ((raw_index - NEUTRAL_FEAR_GREED) * 2.0)
        .round()
        .clamp(-100.0, 100.0) as i32
}

/// Mean absolute 24h change across assets, scaled to 0..=100.
///
/// Non-finite changes are ignored; with no usable change the result is
/// [`FALLBACK_VOLATILITY`].
pub fn normalize_volatility(percent_changes: &[f64]) -> u32 {
    let (sum, count) = percent_changes
        .iter()
        .filter(|c| c.is_finite())
        .fold((0.0_f64, 0_u32), |(sum, count), c| (sum + c.abs(), count + 1));

    if count == 0 {
        return FALLBACK_VOLATILITY;
    }

    let average = sum / f64::from(count);
    (average * VOLATILITY_SCALE).round().clamp(0.0, 100.0) as u32
}

/// Turns the two raw upstream readings into canonical scores plus provenance.
pub fn canonicalize(
    fear_greed: RawSignal<f64>,
    market: RawSignal<Vec<AssetChange>>,
) -> SignalReadings {
    let changes: Vec<f64> = market.value.iter().map(|c| c.change_24h).collect();
    let has_reading = changes.iter().any(|c| c.is_finite());

    let volatility_source = if has_reading {
        market.source
    } else {
        SignalSource::Fallback
    };

    SignalReadings {
        fear_greed_index: fear_greed.value,
        canonical: CanonicalSignals {
            sentiment_score: normalize_sentiment(fear_greed.value),
            volatility_score: normalize_volatility(&changes),
        },
        changes_24h: market.value,
        sentiment_source: fear_greed.source,
        volatility_source,
    }
}
