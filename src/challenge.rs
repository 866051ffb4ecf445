//! "Challenge a friend" links

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::types::Score;

/// Query parameter carrying the challenger's username
pub const CHALLENGER_PARAM: &str = "challenger";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChallengeLink {
    pub url: String,
    pub message: String,
}

/// Build the share link and message for `username` at `score`.
/// Pure: the same inputs always give the same link.
pub fn build_challenge_link(origin: &Url, username: &str, score: Score) -> ChallengeLink {
    let mut url = origin.clone();
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair(CHALLENGER_PARAM, username);

    let url = url.to_string();
    let message = format!(
        "Can you beat my city trivia score? 🌍\nMy Score: {} ✅ {} ❌\nPlay here: {}",
        score.correct, score.incorrect, url
    );

    ChallengeLink { url, message }
}

/// Pull a non-empty challenger name out of a query value
pub fn challenger_from_query(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
