use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LeaderboardError;
use crate::store::{AccountCounts, ContributionStore, Records};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Clamps a requested limit: missing or below 1 means the default, anything
/// above the maximum is capped.
pub fn effective_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(limit) if limit > MAX_LIMIT as i64 => MAX_LIMIT,
        Some(limit) if limit >= 1 => limit as usize,
        _ => DEFAULT_LIMIT,
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    #[default]
    Same,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub username: String,
    pub avatar: String,
    pub user_id: String,
    #[serde(rename = "contributions")]
    pub contribution_count: i64,
    pub ecosystems: Vec<String>,
    pub score: i64,
    pub trend: Trend,
    #[serde(rename = "trendValue")]
    pub trend_value: i64,
}

pub struct ContributionRanker {
    store: Option<Arc<dyn ContributionStore>>,
}

impl ContributionRanker {
    pub fn new(store: Option<Arc<dyn ContributionStore>>) -> Self {
        Self { store }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub async fn compute_leaderboard(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let store = self
            .store
            .as_ref()
            .ok_or(LeaderboardError::DataSourceUnavailable)?;
        let limit = effective_limit(limit);

        let counts = store.contribution_counts().await?;
        let mut accounts: Vec<AccountCounts> = keep_readable("contribution", counts)
            .into_iter()
            .filter(|account| account.contribution_count() > 0)
            .collect();

        accounts.sort_by(|a, b| {
            b.contribution_count()
                .cmp(&a.contribution_count())
                .then_with(|| a.login.cmp(&b.login))
        });
        accounts.truncate(limit);

        let logins: Vec<String> = accounts
            .iter()
            .map(|account| account.login.clone())
            .collect();
        let mut ecosystems: HashMap<String, BTreeSet<String>> = HashMap::new();
        let links = store.ecosystem_links(&logins).await?;
        for link in keep_readable("ecosystem", links) {
            ecosystems.entry(link.login).or_default().insert(link.ecosystem);
        }

        let entries = accounts
            .into_iter()
            .enumerate()
            .map(|(position, account)| {
                let contribution_count = account.contribution_count();
                LeaderboardEntry {
                    rank: position + 1,
                    ecosystems: ecosystems
                        .remove(&account.login)
                        .map(|names| names.into_iter().collect())
                        .unwrap_or_default(),
                    username: account.login,
                    avatar: account.avatar_url.unwrap_or_default(),
                    user_id: account.user_id,
                    contribution_count,
                    // Historical trend is not tracked yet.
                    score: contribution_count,
                    trend: Trend::Same,
                    trend_value: 0,
                }
            })
            .collect();

        Ok(entries)
    }
}

fn keep_readable<T>(kind: &str, records: Records<T>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(error) => {
                log::warn!("skipping unreadable {} record: {}", kind, error);
                None
            }
        })
        .collect()
}
