use serde::{Deserialize, Serialize};
use std::fmt;

/// Rebalancing action. `index()` is the on-chain action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Hold,
    ShiftToStable,
    IncreaseExposure,
    Diversify,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Hold,
        Action::ShiftToStable,
        Action::IncreaseExposure,
        Action::Diversify,
    ];

    pub fn index(self) -> u8 {
        match self {
            Self::Hold => 0,
            Self::ShiftToStable => 1,
            Self::IncreaseExposure => 2,
            Self::Diversify => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "HOLD",
            Self::ShiftToStable => "SHIFT_TO_STABLE",
            Self::IncreaseExposure => "INCREASE_EXPOSURE",
            Self::Diversify => "DIVERSIFY",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Hold => "Market conditions remain within acceptable risk tolerance.",
            Self::ShiftToStable => {
                "Risk is elevated for this profile. Preserve capital by shifting to stable assets."
            }
            Self::IncreaseExposure => {
                "Risk is controlled and sentiment is positive. Increase growth exposure carefully."
            }
            Self::Diversify => {
                "Volatility is high. Diversify allocation to reduce concentration risk."
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub risk_score: u32,
    pub action: Action,
    pub reason: String,
}

impl Recommendation {
    pub fn new(risk_score: u32, action: Action) -> Self {
        Self {
            risk_score,
            action,
            reason: action.reason().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_indices_match_contract_codes() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(usize::from(action.index()), i);
            assert_eq!(Action::from_index(action.index()), Some(*action));
        }
        assert_eq!(Action::from_index(4), None);
    }

    #[test]
    fn serializes_as_contract_names() {
        let v = serde_json::to_value(Action::ShiftToStable).unwrap();
        assert_eq!(v, serde_json::json!("SHIFT_TO_STABLE"));
    }
}
