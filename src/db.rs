use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use crate::config::Config;
use crate::error::{LeaderboardError, RowDecodeError};
use crate::store::{AccountCounts, ContributionStore, EcosystemLink, Records};

#[derive(FromRow)]
struct CountRow {
    username: String,
    avatar_url: Option<String>,
    user_id: String,
    issue_count: i64,
    pull_request_count: i64,
}

impl From<CountRow> for AccountCounts {
    fn from(row: CountRow) -> Self {
        Self {
            login: row.username,
            avatar_url: row.avatar_url,
            user_id: row.user_id,
            issues: row.issue_count,
            pull_requests: row.pull_request_count,
        }
    }
}

#[derive(FromRow)]
struct EcosystemRow {
    login: String,
    ecosystem: String,
}

pub struct Db {
    pub pool: PgPool,
}

impl Db {
    pub async fn connect(database_url: &str, config: &Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ContributionStore for Db {
    async fn contribution_counts(&self) -> Result<Records<AccountCounts>, LeaderboardError> {
        const QUERY: &str = "
            SELECT
                ga.login AS username,
                ga.avatar_url,
                u.id::text AS user_id,
                COALESCE(i.issue_count, 0) AS issue_count,
                COALESCE(pr.pull_request_count, 0) AS pull_request_count
            FROM github_accounts ga
            INNER JOIN users u ON ga.user_id = u.id
            LEFT JOIN (
                SELECT i.author_login, COUNT(*) AS issue_count
                FROM github_issues i
                INNER JOIN projects p ON i.project_id = p.id
                WHERE p.status = 'verified'
                GROUP BY i.author_login
            ) i ON i.author_login = ga.login
            LEFT JOIN (
                SELECT pr.author_login, COUNT(*) AS pull_request_count
                FROM github_pull_requests pr
                INNER JOIN projects p ON pr.project_id = p.id
                WHERE p.status = 'verified'
                GROUP BY pr.author_login
            ) pr ON pr.author_login = ga.login
            WHERE COALESCE(i.issue_count, 0) + COALESCE(pr.pull_request_count, 0) > 0
        ";

        let mut rows = sqlx::query(QUERY).fetch(&self.pool);
        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let index = records.len();
            records.push(
                CountRow::from_row(&row)
                    .map(AccountCounts::from)
                    .map_err(|error| RowDecodeError::new(index, error.to_string())),
            );
        }

        Ok(records)
    }

    async fn ecosystem_links(
        &self,
        logins: &[String],
    ) -> Result<Records<EcosystemLink>, LeaderboardError> {
        if logins.is_empty() {
            return Ok(Vec::new());
        }

        const QUERY: &str = "
            SELECT DISTINCT c.author_login AS login, e.name AS ecosystem
            FROM (
                SELECT i.author_login, p.ecosystem_id
                FROM github_issues i
                INNER JOIN projects p ON i.project_id = p.id
                WHERE p.status = 'verified' AND i.author_login = ANY($1)
                UNION
                SELECT pr.author_login, p.ecosystem_id
                FROM github_pull_requests pr
                INNER JOIN projects p ON pr.project_id = p.id
                WHERE p.status = 'verified' AND pr.author_login = ANY($1)
            ) c
            INNER JOIN ecosystems e ON c.ecosystem_id = e.id
            WHERE e.status = 'active'
        ";

        let mut rows = sqlx::query(QUERY).bind(logins.to_vec()).fetch(&self.pool);
        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let index = records.len();
            records.push(
                EcosystemRow::from_row(&row)
                    .map(|row| EcosystemLink {
                        login: row.login,
                        ecosystem: row.ecosystem,
                    })
                    .map_err(|error| RowDecodeError::new(index, error.to_string())),
            );
        }

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
