use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LeaderboardError, RowDecodeError};

/// Verified-project activity of one account, before ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCounts {
    pub login: String,
    pub avatar_url: Option<String>,
    pub user_id: String,
    pub issues: i64,
    pub pull_requests: i64,
}

impl AccountCounts {
    pub fn contribution_count(&self) -> i64 {
        self.issues + self.pull_requests
    }
}

/// One (login, active ecosystem) pair reached through verified-project activity.
/// Stores may return the same pair more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemLink {
    pub login: String,
    pub ecosystem: String,
}

pub type Records<T> = Vec<Result<T, RowDecodeError>>;

/// Read access to contribution data, independent of how it is stored.
#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// Issue and pull request counts in verified projects for every account
    /// linked to a user.
    async fn contribution_counts(&self) -> Result<Records<AccountCounts>, LeaderboardError>;

    /// Active ecosystems touched by each of `logins` via verified projects.
    async fn ecosystem_links(
        &self,
        logins: &[String],
    ) -> Result<Records<EcosystemLink>, LeaderboardError>;

    fn name(&self) -> &'static str;
}
