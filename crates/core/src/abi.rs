use crate::domain::recommendation::{Action, Recommendation};
use crate::domain::signals::CanonicalSignals;
use alloy::primitives::{hex, I256, U256};
use alloy::sol_types::SolValue;
use anyhow::{anyhow, ensure};

pub const WORD: usize = 32;

/// Constant ESG score committed with every result.
pub const ESG_PLACEHOLDER: u64 = 75;

/// Sentiment is committed with two implied decimals.
pub const SENTIMENT_SCALE: i64 = 100;

/// `(int256,uint256,uint256,uint256,uint256,string)` as committed on-chain.
/// The string is always empty.
pub type ResultTuple = (I256, U256, U256, U256, U256, String);

/// The static head of [`ResultTuple`]; some consumers only forward these.
type StaticResultTuple = (I256, U256, U256, U256, U256);

const STATIC_WORDS: usize = 5;
/// Five static words, the string's head offset, then its length.
pub const ENCODED_LEN: usize = 7 * WORD;

/// Encodes the result tuple consumed by the profile contract and by median aggregation.
///
/// Word order: sentiment x100 (signed), volatility, risk, ESG placeholder,
/// action index, string offset, string length.
pub fn encode_result(recommendation: &Recommendation, signals: &CanonicalSignals) -> Vec<u8> {
    let tuple: ResultTuple = (
        I256::unchecked_from(i64::from(signals.sentiment_score) * SENTIMENT_SCALE),
        U256::from(signals.volatility_score),
        U256::from(recommendation.risk_score),
        U256::from(ESG_PLACEHOLDER),
        U256::from(recommendation.action.index()),
        String::new(),
    );
    tuple.abi_encode_params()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedResult {
    pub sentiment_x100: i64,
    pub volatility_score: u64,
    pub risk_score: u64,
    pub esg_score: u64,
    pub action: Action,
}

/// Decodes the full tuple, or only its five static words when the string
/// tail has been stripped.
pub fn decode_result(bytes: &[u8]) -> anyhow::Result<DecodedResult> {
    ensure!(
        bytes.len() >= STATIC_WORDS * WORD,
        "result must be at least {} bytes (got {})",
        STATIC_WORDS * WORD,
        bytes.len()
    );
    ensure!(
        bytes.len() % WORD == 0,
        "result length must be a multiple of {WORD} (got {})",
        bytes.len()
    );

    let (sentiment, volatility, risk, esg, action) = if bytes.len() >= ENCODED_LEN {
        let (s, v, r, e, a, _reason) = ResultTuple::abi_decode_params(bytes)
            .map_err(|e| anyhow!("result tuple does not decode: {e}"))?;
        (s, v, r, e, a)
    } else {
        StaticResultTuple::abi_decode_params(&bytes[..STATIC_WORDS * WORD])
            .map_err(|e| anyhow!("result words do not decode: {e}"))?
    };

    let action_index = narrow(action, "action")?;
    let action = u8::try_from(action_index)
        .ok()
        .and_then(Action::from_index)
        .ok_or_else(|| anyhow!("action index out of range: {action_index}"))?;

    Ok(DecodedResult {
        sentiment_x100: i64::try_from(sentiment)
            .map_err(|_| anyhow!("sentiment does not fit in i64: {sentiment}"))?,
        volatility_score: narrow(volatility, "volatility")?,
        risk_score: narrow(risk, "risk")?,
        esg_score: narrow(esg, "esg")?,
        action,
    })
}

fn narrow(value: U256, field: &str) -> anyhow::Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} does not fit in u64: {value}"))
}

pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_prefixed(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> (Recommendation, CanonicalSignals) {
        (
            Recommendation::new(66, Action::Hold),
            CanonicalSignals {
                sentiment_score: -60,
                volatility_score: 70,
            },
        )
    }

    #[test]
    fn layout_is_seven_words() {
        let (rec, signals) = scenario_a();
        let bytes = encode_result(&rec, &signals);
        assert_eq!(bytes.len(), ENCODED_LEN);

        // -6000 sign-extended.
        assert!(bytes[..24].iter().all(|b| *b == 0xff));
        assert_eq!(&bytes[24..32], &(-6000i64).to_be_bytes());
        assert_eq!(bytes[63], 70);
        assert_eq!(bytes[95], 66);
        assert_eq!(bytes[127], 75);
        assert_eq!(bytes[159], 0);
        assert_eq!(bytes[191], 192);
        assert!(bytes[192..].iter().all(|b| *b == 0));
    }

    #[test]
    fn hex_matches_known_encoding() {
        let rec = Recommendation::new(12, Action::IncreaseExposure);
        let signals = CanonicalSignals {
            sentiment_score: 60,
            volatility_score: 20,
        };
        let hex = to_hex(&encode_result(&rec, &signals));
        let expected = concat!(
            "0x",
            "0000000000000000000000000000000000000000000000000000000000001770",
            "0000000000000000000000000000000000000000000000000000000000000014",
            "000000000000000000000000000000000000000000000000000000000000000c",
            "000000000000000000000000000000000000000000000000000000000000004b",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "00000000000000000000000000000000000000000000000000000000000000c0",
            "0000000000000000000000000000000000000000000000000000000000000000",
        );
        assert_eq!(hex, expected);
    }

    #[test]
    fn encoding_is_deterministic() {
        let (rec, signals) = scenario_a();
        assert_eq!(encode_result(&rec, &signals), encode_result(&rec, &signals));
    }

    #[test]
    fn decode_reads_back_fields() {
        let (rec, signals) = scenario_a();
        let decoded = decode_result(&encode_result(&rec, &signals)).unwrap();
        assert_eq!(decoded.sentiment_x100, -6000);
        assert_eq!(decoded.volatility_score, 70);
        assert_eq!(decoded.risk_score, 66);
        assert_eq!(decoded.esg_score, ESG_PLACEHOLDER);
        assert_eq!(decoded.action, Action::Hold);
    }

    #[test]
    fn decode_accepts_compact_five_word_payload() {
        let (rec, signals) = scenario_a();
        let bytes = encode_result(&rec, &signals);
        let compact = decode_result(&bytes[..5 * WORD]).unwrap();
        assert_eq!(compact, decode_result(&bytes).unwrap());
        assert!(decode_result(&bytes[..4 * WORD]).is_err());
    }

    #[test]
    fn decode_rejects_bad_action_and_oversized_words() {
        let (rec, signals) = scenario_a();
        let mut bytes = encode_result(&rec, &signals);
        bytes[159] = 4;
        assert!(decode_result(&bytes).is_err());

        let mut bytes = encode_result(&rec, &signals);
        bytes[32] = 0x01;
        assert!(decode_result(&bytes).is_err());
    }
}
