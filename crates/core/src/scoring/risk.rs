/// Combines the canonical scores into a 0..=100 risk score.
///
/// Only negative sentiment contributes; volatility always does. Weights are
/// 0.4 and 0.6, evaluated in integer tenths so the result is exact. The
/// weighted sum is always even in tenths, so there is never a half to round.
pub fn compose_risk(sentiment_score: i32, volatility_score: u32) -> u32 {
    let negative_sentiment = if sentiment_score < 0 {
        u64::from(sentiment_score.unsigned_abs())
    } else {
        0
    };

    let tenths = negative_sentiment * 4 + u64::from(volatility_score) * 6;
    let rounded = (tenths + 5) / 10;
    rounded.min(100) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_negative_sentiment_and_volatility() {
        assert_eq!(compose_risk(-60, 70), 66);
        assert_eq!(compose_risk(-80, 100), 92);
        assert_eq!(compose_risk(60, 20), 12);
        assert_eq!(compose_risk(0, 0), 0);
    }

    #[test]
    fn positive_sentiment_does_not_reduce_risk() {
        assert_eq!(compose_risk(100, 50), compose_risk(0, 50));
    }

    #[test]
    fn matches_float_formula_over_the_whole_domain() {
        for sentiment in -100..=100 {
            for volatility in 0..=100u32 {
                let negative = if sentiment < 0 { f64::from(-sentiment) } else { 0.0 };
                let expected = (negative * 0.4 + f64::from(volatility) * 0.6)
                    .round()
                    .min(100.0) as u32;
                let got = compose_risk(sentiment, volatility);
                assert_eq!(got, expected, "sentiment={sentiment} volatility={volatility}");
                assert!(got <= 100);
            }
        }
    }
}
