use crate::domain::profile::Address;
use std::fmt;

/// Fatal failure of a recommendation cycle, tagged with the step that failed.
#[derive(Debug, Clone)]
pub struct CycleError {
    pub stage: &'static str,
    pub user: Address,
    pub detail: String,
}

impl CycleError {
    pub fn new(stage: &'static str, user: Address, err: &anyhow::Error) -> Self {
        Self {
            stage,
            user,
            detail: format!("{err:#}"),
        }
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recommendation cycle failed (stage={}, user={}): {}",
            self.stage, self.user, self.detail
        )
    }
}

impl std::error::Error for CycleError {}
