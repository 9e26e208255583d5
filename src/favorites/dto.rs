use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Movie;

/// `movieId` is kept raw so numbers and numeric strings both validate.
#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    #[serde(rename = "movieId", default)]
    pub movie_id: Value,
}

#[derive(Debug, Serialize)]
pub struct FavoriteMovie {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "suggestionForTodayScore")]
    pub suggestion_for_today_score: u8,
}
