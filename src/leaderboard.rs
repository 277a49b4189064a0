use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::error::LeaderboardError;
use crate::ranker::ContributionRanker;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// A `limit` that is not an integer counts as absent.
fn requested_limit(query: &HashMap<String, String>) -> Option<i64> {
    query.get("limit").and_then(|limit| limit.trim().parse().ok())
}

pub async fn leaderboard(
    query: HashMap<String, String>,
    ranker: Arc<ContributionRanker>,
) -> WithStatus<Json> {
    match ranker.compute_leaderboard(requested_limit(&query)).await {
        Ok(entries) => warp::reply::with_status(warp::reply::json(&entries), StatusCode::OK),
        Err(error) => {
            let status = match error {
                LeaderboardError::DataSourceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                LeaderboardError::FetchFailed(_) => {
                    log::error!("failed to fetch leaderboard: {}", error);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let body = ErrorBody {
                error: error.code(),
            };
            warp::reply::with_status(warp::reply::json(&body), status)
        }
    }
}

pub fn route(
    ranker: Arc<ContributionRanker>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("leaderboard")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::any().map(move || ranker.clone()))
        .then(leaderboard)
}
