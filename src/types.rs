use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type SessionId = String;
pub type Username = String;

/// Number of answer choices offered per question
pub const CHOICE_COUNT: usize = 4;

/// A city as served by the trivia backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    #[serde(rename = "city")]
    pub name: String,
    #[serde(default)]
    pub clues: Vec<String>,
    #[serde(rename = "fun_fact", default)]
    pub fun_facts: Vec<String>,
}

/// One drawn trivia question, replaced on every draw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub clue: String,
    pub correct_answer: String,
    pub fun_fact: String,
}

/// Ordered answer choices for the current question (distinct city names)
pub type ChoiceSet = Vec<String>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub incorrect: u32,
}

impl Score {
    /// Count one answer; exactly one of the two counters moves
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn answered(&self) -> u32 {
        self.correct + self.incorrect
    }
}

/// A player's record on the backend (local player or a challenger)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub username: Username,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub incorrect: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Unregistered,
    Loading,
    AwaitingAnswer,
    Answered,
}

/// Tri-state correctness of the current question
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOutcome {
    #[default]
    Unanswered,
    Correct,
    Incorrect,
}

impl AnswerOutcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_uses_backend_field_names() {
        let json = r#"{"city":"Paris","clues":["Eiffel Tower"],"fun_fact":["Croissants"]}"#;
        let city: City = serde_json::from_str(json).unwrap();
        assert_eq!(city.name, "Paris");
        assert_eq!(city.clues, vec!["Eiffel Tower".to_string()]);
        assert_eq!(city.fun_facts, vec!["Croissants".to_string()]);
    }

    #[test]
    fn test_score_record_moves_one_counter() {
        let mut score = Score::default();
        score.record(true);
        assert_eq!(score, Score { correct: 1, incorrect: 0 });
        score.record(false);
        assert_eq!(score, Score { correct: 1, incorrect: 1 });
        assert_eq!(score.answered(), 2);
    }

    #[test]
    fn test_profile_missing_counters_default_to_zero() {
        let profile: UserProfile = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(profile.correct, 0);
        assert_eq!(profile.incorrect, 0);
    }
}
