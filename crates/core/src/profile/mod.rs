pub mod rpc;

use crate::domain::profile::{Address, UserRiskProfile};
use anyhow::Result;

/// Read access to the on-chain profile. Failure here is fatal to a cycle.
#[async_trait::async_trait]
pub trait ProfileReader: Send + Sync {
    fn reader_name(&self) -> &'static str;

    async fn read_user_profile(&self, user: &Address) -> Result<UserRiskProfile>;
}

/// Returns the same profile for every user. Used when no chain is configured.
#[derive(Debug, Clone, Copy)]
pub struct StaticProfileReader {
    profile: UserRiskProfile,
}

impl StaticProfileReader {
    pub fn new(profile: UserRiskProfile) -> Self {
        Self { profile }
    }
}

#[async_trait::async_trait]
impl ProfileReader for StaticProfileReader {
    fn reader_name(&self) -> &'static str {
        "static"
    }

    async fn read_user_profile(&self, _user: &Address) -> Result<UserRiskProfile> {
        Ok(self.profile)
    }
}
