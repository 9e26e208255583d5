use serde::{Deserialize, Serialize};

use crate::store::Movie;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Catalog entry with its per-request suggestion score.
#[derive(Debug, Serialize)]
pub struct SuggestedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "suggestionScore")]
    pub suggestion_score: u8,
}
