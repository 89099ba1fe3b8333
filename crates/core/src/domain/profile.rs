use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use alloy::primitives::Address;

/// On-chain risk tolerance. Discriminants match the profile contract's enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    /// Accepts the enum name in any case or its numeric index.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Self::from_index(index)
                .with_context(|| format!("risk level index out of range: {index}"));
        }

        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => bail!("unknown risk level: {s:?}"),
        }
    }
}

/// Snapshot of the user's profile as stored by the profile contract.
///
/// Read once per cycle and never mutated by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRiskProfile {
    pub risk_level: RiskLevel,
    pub esg_priority: bool,
    pub automation_enabled: bool,
    /// Unix seconds; 0 means never rebalanced.
    pub last_rebalance: u64,
}

impl UserRiskProfile {
    pub fn with_risk_level(risk_level: RiskLevel) -> Self {
        Self {
            risk_level,
            esg_priority: false,
            automation_enabled: false,
            last_rebalance: 0,
        }
    }
}
