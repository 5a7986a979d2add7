//! API DTOs (Data Transfer Objects)

use crate::application::LeaderboardEntry;
use serde::{Deserialize, Serialize};

/// Query for GET /setname
#[derive(Debug, Clone, Deserialize)]
pub struct SetNameQuery {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response for GET /leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub miners: Vec<LeaderboardEntry>,
}
