use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LeaderboardError, RowDecodeError};
use crate::store::{AccountCounts, ContributionStore, EcosystemLink, Records};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Verified,
    #[default]
    #[serde(other)]
    Unverified,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EcosystemStatus {
    Active,
    #[default]
    #[serde(other)]
    Inactive,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Accounts without a linked user never rank.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: String,
    pub status: ProjectStatus,
    pub ecosystem_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Ecosystem {
    pub id: String,
    pub name: String,
    pub status: EcosystemStatus,
}

/// An issue or pull request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Contribution {
    pub author_login: String,
    pub project_id: String,
}

/// Point-in-time copy of the tables the leaderboard reads.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub ecosystems: Vec<Ecosystem>,
    #[serde(default)]
    pub issues: Vec<Contribution>,
    #[serde(default)]
    pub pull_requests: Vec<Contribution>,
}

pub struct SnapshotStore {
    snapshot: Snapshot,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;

        Ok(Self::new(snapshot))
    }

    fn verified_projects(&self) -> HashMap<&str, &Project> {
        self.snapshot
            .projects
            .iter()
            .filter(|project| project.status == ProjectStatus::Verified)
            .map(|project| (project.id.as_str(), project))
            .collect()
    }

    fn verified_counts(
        contributions: &[Contribution],
        verified: &HashMap<&str, &Project>,
    ) -> HashMap<String, i64> {
        let mut counts = HashMap::new();
        for contribution in contributions {
            if verified.contains_key(contribution.project_id.as_str()) {
                *counts.entry(contribution.author_login.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[async_trait]
impl ContributionStore for SnapshotStore {
    async fn contribution_counts(&self) -> Result<Records<AccountCounts>, LeaderboardError> {
        let verified = self.verified_projects();
        let issues = Self::verified_counts(&self.snapshot.issues, &verified);
        let pull_requests = Self::verified_counts(&self.snapshot.pull_requests, &verified);

        let records = self
            .snapshot
            .accounts
            .iter()
            .enumerate()
            .filter_map(|(index, account)| {
                let user_id = account.user_id.clone()?;
                if account.login.trim().is_empty() {
                    return Some(Err(RowDecodeError::new(index, "account has an empty login")));
                }

                let counts = AccountCounts {
                    login: account.login.clone(),
                    avatar_url: account.avatar_url.clone(),
                    user_id,
                    issues: issues.get(&account.login).copied().unwrap_or(0),
                    pull_requests: pull_requests.get(&account.login).copied().unwrap_or(0),
                };
                (counts.contribution_count() > 0).then_some(Ok(counts))
            })
            .collect();

        Ok(records)
    }

    async fn ecosystem_links(
        &self,
        logins: &[String],
    ) -> Result<Records<EcosystemLink>, LeaderboardError> {
        let wanted: HashSet<&str> = logins.iter().map(String::as_str).collect();
        let verified = self.verified_projects();
        let active: HashMap<&str, &str> = self
            .snapshot
            .ecosystems
            .iter()
            .filter(|ecosystem| ecosystem.status == EcosystemStatus::Active)
            .map(|ecosystem| (ecosystem.id.as_str(), ecosystem.name.as_str()))
            .collect();

        let links = self
            .snapshot
            .issues
            .iter()
            .chain(&self.snapshot.pull_requests)
            .filter(|contribution| wanted.contains(contribution.author_login.as_str()))
            .filter_map(|contribution| {
                let project = verified.get(contribution.project_id.as_str())?;
                let name = active.get(project.ecosystem_id.as_str())?;
                Some(Ok(EcosystemLink {
                    login: contribution.author_login.clone(),
                    ecosystem: name.to_string(),
                }))
            })
            .collect();

        Ok(links)
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        serde_json::from_value(serde_json::json!({
            "accounts": [
                { "login": "alice", "avatar_url": "https://a/alice.png", "user_id": "u1" },
                { "login": "bob", "user_id": "u2" },
                { "login": "ghost" },
                { "login": "", "user_id": "u4" }
            ],
            "projects": [
                { "id": "p1", "status": "verified", "ecosystem_id": "e1" },
                { "id": "p2", "status": "pending", "ecosystem_id": "e1" },
                { "id": "p3", "status": "verified", "ecosystem_id": "e2" }
            ],
            "ecosystems": [
                { "id": "e1", "name": "npm", "status": "active" },
                { "id": "e2", "name": "crates", "status": "archived" }
            ],
            "issues": [
                { "author_login": "alice", "project_id": "p1" },
                { "author_login": "alice", "project_id": "p2" },
                { "author_login": "bob", "project_id": "p2" },
                { "author_login": "ghost", "project_id": "p1" }
            ],
            "pull_requests": [
                { "author_login": "alice", "project_id": "p3" },
                { "author_login": "alice", "project_id": "p1" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn unknown_statuses_deserialize_as_not_counted() {
        let snapshot = snapshot();
        assert_eq!(snapshot.projects[1].status, ProjectStatus::Unverified);
        assert_eq!(snapshot.ecosystems[1].status, EcosystemStatus::Inactive);
    }

    #[tokio::test]
    async fn counts_only_verified_activity_of_linked_accounts() {
        let store = SnapshotStore::new(snapshot());
        let records = store.contribution_counts().await.unwrap();

        let ok: Vec<_> = records.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].login, "alice");
        assert_eq!(ok[0].issues, 1);
        assert_eq!(ok[0].pull_requests, 2);

        let bad: Vec<_> = records.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(bad, vec![&RowDecodeError::new(3, "account has an empty login")]);
    }

    #[tokio::test]
    async fn links_skip_inactive_ecosystems_and_other_logins() {
        let store = SnapshotStore::new(snapshot());
        let links: Vec<_> = store
            .ecosystem_links(&["alice".to_string()])
            .await
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert!(!links.is_empty());
        assert!(links
            .iter()
            .all(|link| link.login == "alice" && link.ecosystem == "npm"));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let error = SnapshotStore::from_file(Path::new("/nonexistent/snapshot.json"))
            .err()
            .unwrap();
        assert!(error.to_string().contains("/nonexistent/snapshot.json"));
    }
}
