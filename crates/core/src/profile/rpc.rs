use crate::domain::profile::{Address, RiskLevel, UserRiskProfile};
use crate::profile::ProfileReader;
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::time::Duration;

sol! {
    #[sol(rpc)]
    interface ILinkForgeProfile {
        function getProfile(address user) external view returns (
            uint8 riskLevel,
            bool esgPriority,
            bool automationEnabled,
            uint256 lastRebalance
        );
    }
}

pub use ILinkForgeProfile::{getProfileCall, getProfileReturn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

impl TryFrom<getProfileReturn> for UserRiskProfile {
    type Error = anyhow::Error;

    fn try_from(ret: getProfileReturn) -> Result<Self> {
        let risk_level = RiskLevel::from_index(ret.riskLevel)
            .with_context(|| format!("riskLevel out of range: {}", ret.riskLevel))?;
        let last_rebalance = u64::try_from(ret.lastRebalance)
            .map_err(|_| anyhow!("lastRebalance does not fit in u64: {}", ret.lastRebalance))?;

        Ok(Self {
            risk_level,
            esg_priority: ret.esgPriority,
            automation_enabled: ret.automationEnabled,
            last_rebalance,
        })
    }
}

/// Decodes raw `getProfile` return data.
pub fn decode_profile(data: &[u8]) -> Result<UserRiskProfile> {
    let ret = getProfileCall::abi_decode_returns(data)
        .map_err(|e| anyhow!("getProfile returned malformed data: {e}"))?;
    UserRiskProfile::try_from(ret)
}

/// Reads profiles with an `eth_call` of `getProfile(address)` against the profile contract.
#[derive(Debug, Clone)]
pub struct RpcProfileReader {
    rpc_url: Url,
    contract: Address,
    timeout: Duration,
}

impl RpcProfileReader {
    pub fn new(rpc_url: &str, contract: Address) -> Result<Self> {
        let rpc_url = rpc_url
            .parse::<Url>()
            .with_context(|| format!("invalid RPC url: {rpc_url}"))?;

        Ok(Self {
            rpc_url,
            contract,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

#[async_trait::async_trait]
impl ProfileReader for RpcProfileReader {
    fn reader_name(&self) -> &'static str {
        "evm_rpc"
    }

    async fn read_user_profile(&self, user: &Address) -> Result<UserRiskProfile> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = ILinkForgeProfile::new(self.contract, provider);

        let ret = tokio::time::timeout(self.timeout, contract.getProfile(*user).call())
            .await
            .map_err(|_| anyhow!("getProfile({user}) timed out after {:?}", self.timeout))?
            .map_err(|e| anyhow!("eth_call getProfile({user}) failed: {e}"))?;

        UserRiskProfile::try_from(ret).with_context(|| format!("invalid profile for {user}"))
    }
}
