//! One player's quiz session
//!
//! Phases run `Unregistered -> Loading -> AwaitingAnswer <-> Answered`.
//! A session is owned by exactly one connection task, so nothing here
//! needs locking. Backend calls go through the shared [`QuizApi`]; score
//! changes are handed to the score-sync queue and never awaited.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::backend::{ApiError, QuizApi, Registration};
use crate::catalog::{Catalog, CatalogError};
use crate::challenge::{build_challenge_link, ChallengeLink};
use crate::config::SessionConfig;
use crate::selector::{select_question, SelectError};
use crate::sync::ScoreSyncHandle;
use crate::types::*;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RegisterError {
    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Session is already registered")]
    AlreadyRegistered,

    #[error("Username '{0}' is already taken")]
    AlreadyTaken(String),

    #[error("Registration failed: {0}")]
    Network(ApiError),
}

impl RegisterError {
    pub fn code(&self) -> &'static str {
        match self {
            RegisterError::EmptyUsername => "EMPTY_USERNAME",
            RegisterError::AlreadyRegistered => "ALREADY_REGISTERED",
            RegisterError::AlreadyTaken(_) => "USERNAME_TAKEN",
            RegisterError::Network(_) => "NETWORK_ERROR",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Register before playing")]
    NotRegistered,

    #[error("Session is not waiting for the catalog (phase {0:?})")]
    NotLoading(SessionPhase),

    #[error("No question is waiting for an answer")]
    QuestionNotReady,

    #[error("This question has already been answered")]
    AlreadyAnswered,

    #[error("Answer the current question first")]
    NotAnswered,

    #[error("'{0}' is not one of the offered choices")]
    UnknownChoice(String),

    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Select(#[from] SelectError),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotRegistered => "NOT_REGISTERED",
            SessionError::NotLoading(_) => "NOT_LOADING",
            SessionError::QuestionNotReady => "QUESTION_NOT_READY",
            SessionError::AlreadyAnswered => "ALREADY_ANSWERED",
            SessionError::NotAnswered => "NOT_ANSWERED",
            SessionError::UnknownChoice(_) => "UNKNOWN_CHOICE",
            SessionError::Catalog(_) => "CATALOG_UNAVAILABLE",
            SessionError::Select(_) => "SELECTION_FAILED",
        }
    }
}

/// What the player sees of a question before answering (no answer, no fun fact)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionCard {
    pub clue: String,
    pub choices: ChoiceSet,
}

/// Feedback after an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerFeedback {
    pub selected: String,
    pub correct: bool,
    pub correct_answer: String,
    pub fun_fact: String,
    pub score: Score,
}

pub struct Session {
    id: SessionId,
    config: SessionConfig,
    api: Arc<dyn QuizApi>,
    score_sync: ScoreSyncHandle,
    rng: StdRng,

    phase: SessionPhase,
    username: String,
    catalog: Option<Catalog>,
    question: Option<Question>,
    choices: ChoiceSet,
    selected: Option<String>,
    outcome: AnswerOutcome,
    score: Score,
    asked: HashSet<String>,
    challenger: Option<UserProfile>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        api: Arc<dyn QuizApi>,
        score_sync: ScoreSyncHandle,
        rng: StdRng,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            config,
            api,
            score_sync,
            rng,
            phase: SessionPhase::Unregistered,
            username: String::new(),
            catalog: None,
            question: None,
            choices: Vec::new(),
            selected: None,
            outcome: AnswerOutcome::Unanswered,
            score: Score::default(),
            asked: HashSet::new(),
            challenger: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_registered(&self) -> bool {
        self.phase != SessionPhase::Unregistered
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn outcome(&self) -> AnswerOutcome {
        self.outcome
    }

    pub fn asked(&self) -> &HashSet<String> {
        &self.asked
    }

    pub fn challenger(&self) -> Option<&UserProfile> {
        self.challenger.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The question as shown to the player, if one is drawn
    pub fn question_card(&self) -> Option<QuestionCard> {
        self.question.as_ref().map(|q| QuestionCard {
            clue: q.clue.clone(),
            choices: self.choices.clone(),
        })
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register `username` with the backend. On success the session moves to
    /// `Loading`; on any failure it stays `Unregistered` and keeps the typed
    /// name so the player can correct it.
    pub async fn register(&mut self, username: &str) -> Result<(), RegisterError> {
        if self.is_registered() {
            return Err(RegisterError::AlreadyRegistered);
        }

        self.username = username.trim().to_string();
        if self.username.is_empty() {
            return Err(RegisterError::EmptyUsername);
        }

        match self.api.register(&self.username).await {
            Ok(Registration::Created) => {
                self.phase = SessionPhase::Loading;
                tracing::info!("Session {} registered as {}", self.id, self.username);
                Ok(())
            }
            Ok(Registration::UsernameTaken) => {
                tracing::info!("Username {} is already taken", self.username);
                Err(RegisterError::AlreadyTaken(self.username.clone()))
            }
            Err(e) => {
                tracing::warn!("Registration of {} failed: {}", self.username, e);
                Err(RegisterError::Network(e))
            }
        }
    }

    // =========================================================================
    // Catalog and questions
    // =========================================================================

    /// Fetch the catalog and draw the first question
    pub async fn load_catalog(&mut self) -> Result<QuestionCard, SessionError> {
        self.require_loading()?;

        let catalog = match Catalog::fetch(self.api.as_ref()).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("Session {} could not load cities: {}", self.id, e);
                return Err(e.into());
            }
        };

        self.install_catalog(catalog)
    }

    /// Use an already fetched catalog and draw the first question
    pub fn install_catalog(&mut self, catalog: Catalog) -> Result<QuestionCard, SessionError> {
        self.require_loading()?;

        self.catalog = Some(catalog);
        self.asked.clear();
        let card = self.draw()?;
        self.phase = SessionPhase::AwaitingAnswer;
        Ok(card)
    }

    /// Move on from an answered question to a fresh one
    pub fn next_question(&mut self) -> Result<QuestionCard, SessionError> {
        match self.phase {
            SessionPhase::Unregistered => return Err(SessionError::NotRegistered),
            SessionPhase::Loading => return Err(SessionError::QuestionNotReady),
            SessionPhase::AwaitingAnswer => return Err(SessionError::NotAnswered),
            SessionPhase::Answered => {}
        }

        let card = self.draw()?;
        self.phase = SessionPhase::AwaitingAnswer;
        Ok(card)
    }

    fn require_loading(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Loading => Ok(()),
            SessionPhase::Unregistered => Err(SessionError::NotRegistered),
            phase => Err(SessionError::NotLoading(phase)),
        }
    }

    fn draw(&mut self) -> Result<QuestionCard, SessionError> {
        let catalog = self.catalog.as_ref().ok_or(SessionError::QuestionNotReady)?;
        let draw = select_question(catalog, &self.asked, &mut self.rng)?;

        tracing::debug!(
            "Session {} drew {} ({} of {} asked)",
            self.id,
            draw.question.correct_answer,
            draw.asked.len(),
            catalog.cities().len()
        );

        self.asked = draw.asked;
        self.question = Some(draw.question);
        self.choices = draw.choices;
        self.selected = None;
        self.outcome = AnswerOutcome::Unanswered;

        self.question_card().ok_or(SessionError::QuestionNotReady)
    }

    // =========================================================================
    // Answering
    // =========================================================================

    /// Answer the current question. Only the first answer counts; later
    /// submissions for the same question are rejected without side effects.
    pub fn submit_answer(&mut self, choice: &str) -> Result<AnswerFeedback, SessionError> {
        match self.phase {
            SessionPhase::Unregistered => return Err(SessionError::NotRegistered),
            SessionPhase::Loading => return Err(SessionError::QuestionNotReady),
            SessionPhase::Answered => return Err(SessionError::AlreadyAnswered),
            SessionPhase::AwaitingAnswer => {}
        }

        let question = self
            .question
            .as_ref()
            .ok_or(SessionError::QuestionNotReady)?;
        if !self.choices.iter().any(|c| c == choice) {
            return Err(SessionError::UnknownChoice(choice.to_string()));
        }

        let correct = choice == question.correct_answer;
        let feedback = AnswerFeedback {
            selected: choice.to_string(),
            correct,
            correct_answer: question.correct_answer.clone(),
            fun_fact: question.fun_fact.clone(),
            score: Score::default(),
        };

        self.selected = Some(choice.to_string());
        self.outcome = AnswerOutcome::from_correct(correct);
        self.score.record(correct);
        self.phase = SessionPhase::Answered;

        self.score_sync.push(&self.username, self.score);

        Ok(AnswerFeedback {
            score: self.score,
            ..feedback
        })
    }

    // =========================================================================
    // Challenges
    // =========================================================================

    /// Share link for the current score
    pub fn challenge_link(&self) -> Result<ChallengeLink, SessionError> {
        if !self.is_registered() {
            return Err(SessionError::NotRegistered);
        }
        Ok(build_challenge_link(
            &self.config.app_origin,
            &self.username,
            self.score,
        ))
    }

    /// Look up the challenger named in the session config, if any.
    /// Failures are logged and leave the challenger unset.
    pub async fn lookup_challenger(&mut self) -> Option<&UserProfile> {
        let name = self.config.challenger.clone()?;
        self.challenger = lookup_challenger(self.api.as_ref(), &name).await;
        self.challenger.as_ref()
    }
}

/// Fetch a challenger's profile, swallowing failures
pub async fn lookup_challenger(api: &dyn QuizApi, name: &str) -> Option<UserProfile> {
    match api.fetch_user(name).await {
        Ok(profile) => {
            tracing::info!(
                "Challenger {} has {} correct, {} incorrect",
                profile.username,
                profile.correct,
                profile.incorrect
            );
            Some(profile)
        }
        Err(e) => {
            tracing::warn!("Error fetching challenger {}: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ApiCall, MockApi};
    use crate::catalog::city;
    use crate::selector::seeded_random;
    use crate::sync::spawn_score_sync;

    fn cities() -> Vec<City> {
        vec![city("Paris"), city("Rome"), city("Lima"), city("Oslo")]
    }

    fn session_with(api: Arc<MockApi>, rng: StdRng) -> Session {
        let (sync, _task) = spawn_score_sync(api.clone());
        Session::new(SessionConfig::default(), api, sync, rng)
    }

    async fn playing_session(api: Arc<MockApi>) -> Session {
        let mut session = session_with(api, seeded_random(7));
        session.register("alice").await.unwrap();
        session.load_catalog().await.unwrap();
        session
    }

    fn wrong_choice(session: &Session) -> String {
        let answer = &session.question().unwrap().correct_answer;
        session
            .choices()
            .iter()
            .find(|c| *c != answer)
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_new_session_is_unregistered() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let session = session_with(api, seeded_random(7));

        assert_eq!(session.phase(), SessionPhase::Unregistered);
        assert!(!session.is_registered());
        assert_eq!(session.score(), Score::default());
        assert!(session.question().is_none());
        assert!(!session.id().is_empty());
    }

    #[tokio::test]
    async fn test_register_then_load_draws_first_question() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = session_with(api.clone(), seeded_random(7));

        session.register("  alice ").await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.username(), "alice");

        let card = session.load_catalog().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        let answer = session.question().unwrap().correct_answer.clone();
        assert_eq!(card.clue, format!("{} clue", answer));
        assert_eq!(card.choices.len(), CHOICE_COUNT);
        assert!(card.choices.contains(&answer));
        assert_eq!(session.asked().len(), 1);
        assert!(session.asked().contains(&answer));
        assert_eq!(
            api.calls().await,
            vec![ApiCall::Register("alice".to_string()), ApiCall::FetchCities]
        );
    }

    #[tokio::test]
    async fn test_taken_username_stays_unregistered() {
        let api = Arc::new(MockApi::with_cities(cities()));
        api.register("alice").await.unwrap();
        let mut session = session_with(api, seeded_random(7));

        let result = session.register("alice").await;
        assert_eq!(
            result.unwrap_err(),
            RegisterError::AlreadyTaken("alice".to_string())
        );
        assert!(!session.is_registered());
        assert_eq!(session.username(), "alice");

        // A corrected name goes through
        session.register("alice2").await.unwrap();
        assert!(session.is_registered());
    }

    #[tokio::test]
    async fn test_register_network_failure() {
        let api = Arc::new(MockApi::new());
        api.fail("register").await;
        let mut session = session_with(api, seeded_random(7));

        let err = session.register("alice").await.unwrap_err();
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert_eq!(session.phase(), SessionPhase::Unregistered);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_and_repeat() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = session_with(api.clone(), seeded_random(7));

        assert_eq!(
            session.register("   ").await.unwrap_err(),
            RegisterError::EmptyUsername
        );
        assert!(api.calls().await.is_empty());

        session.register("alice").await.unwrap();
        assert_eq!(
            session.register("bob").await.unwrap_err(),
            RegisterError::AlreadyRegistered
        );
        assert_eq!(session.username(), "alice");
    }

    #[tokio::test]
    async fn test_catalog_failure_keeps_loading() {
        let api = Arc::new(MockApi::with_cities(cities()));
        api.fail("cities").await;
        let mut session = session_with(api.clone(), seeded_random(7));
        session.register("alice").await.unwrap();

        let err = session.load_catalog().await.unwrap_err();
        assert_eq!(err.code(), "CATALOG_UNAVAILABLE");
        assert_eq!(session.phase(), SessionPhase::Loading);

        api.recover("cities").await;
        assert!(session.load_catalog().await.is_ok());
    }

    #[tokio::test]
    async fn test_cannot_play_before_registering() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = session_with(api, seeded_random(7));

        assert_eq!(
            session.load_catalog().await.unwrap_err(),
            SessionError::NotRegistered
        );
        assert_eq!(
            session.submit_answer("Paris").unwrap_err(),
            SessionError::NotRegistered
        );
        assert_eq!(
            session.next_question().unwrap_err(),
            SessionError::NotRegistered
        );
        assert_eq!(
            session.challenge_link().unwrap_err(),
            SessionError::NotRegistered
        );
    }

    #[tokio::test]
    async fn test_correct_then_incorrect_scores_one_each() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = playing_session(api).await;

        let answer = session.question().unwrap().correct_answer.clone();
        let feedback = session.submit_answer(&answer).unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.fun_fact, format!("{} fact", answer));
        assert_eq!(feedback.score, Score { correct: 1, incorrect: 0 });
        assert_eq!(session.outcome(), AnswerOutcome::Correct);

        session.next_question().unwrap();
        let wrong = wrong_choice(&session);
        let feedback = session.submit_answer(&wrong).unwrap();
        assert!(!feedback.correct);
        assert_eq!(session.outcome(), AnswerOutcome::Incorrect);
        assert_eq!(session.score(), Score { correct: 1, incorrect: 1 });
    }

    #[tokio::test]
    async fn test_second_answer_is_rejected_without_effect() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = playing_session(api).await;

        let wrong = wrong_choice(&session);
        session.submit_answer(&wrong).unwrap();
        let answer = session.question().unwrap().correct_answer.clone();

        assert_eq!(
            session.submit_answer(&answer).unwrap_err(),
            SessionError::AlreadyAnswered
        );
        assert_eq!(session.score(), Score { correct: 0, incorrect: 1 });
        assert_eq!(session.selected_answer(), Some(wrong.as_str()));
        assert_eq!(session.phase(), SessionPhase::Answered);
    }

    #[tokio::test]
    async fn test_unknown_choice_is_rejected() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = playing_session(api).await;

        assert_eq!(
            session.submit_answer("Atlantis").unwrap_err(),
            SessionError::UnknownChoice("Atlantis".to_string())
        );
        assert_eq!(session.score(), Score::default());
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
    }

    #[tokio::test]
    async fn test_next_question_requires_answer_and_clears_selection() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = playing_session(api).await;

        assert_eq!(
            session.next_question().unwrap_err(),
            SessionError::NotAnswered
        );

        let answer = session.question().unwrap().correct_answer.clone();
        session.submit_answer(&answer).unwrap();
        session.next_question().unwrap();

        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        assert!(session.selected_answer().is_none());
        assert_eq!(session.outcome(), AnswerOutcome::Unanswered);
        assert_ne!(session.question().unwrap().correct_answer, answer);
    }

    #[tokio::test]
    async fn test_full_deck_before_repeat() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = playing_session(api).await;
        let mut seen = vec![session.question().unwrap().correct_answer.clone()];

        for _ in 0..3 {
            let answer = session.question().unwrap().correct_answer.clone();
            session.submit_answer(&answer).unwrap();
            session.next_question().unwrap();
            seen.push(session.question().unwrap().correct_answer.clone());
        }

        seen.sort();
        assert_eq!(seen, vec!["Lima", "Oslo", "Paris", "Rome"]);
        assert_eq!(session.score().correct, 3);
    }

    #[tokio::test]
    async fn test_each_answer_queues_one_score_sync() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let (sync, task) = spawn_score_sync(api.clone());
        let mut session = Session::new(
            SessionConfig::default(),
            api.clone(),
            sync,
            seeded_random(7),
        );
        session.register("alice").await.unwrap();
        session.load_catalog().await.unwrap();

        let answer = session.question().unwrap().correct_answer.clone();
        session.submit_answer(&answer).unwrap();
        let _ = session.submit_answer(&answer);
        session.next_question().unwrap();
        let wrong = wrong_choice(&session);
        session.submit_answer(&wrong).unwrap();

        drop(session);
        task.await.unwrap();

        assert_eq!(
            api.score_updates().await,
            vec![
                ("alice".to_string(), Score { correct: 1, incorrect: 0 }),
                ("alice".to_string(), Score { correct: 1, incorrect: 1 }),
            ]
        );
        assert_eq!(api.user("alice").await.unwrap().incorrect, 1);
    }

    #[tokio::test]
    async fn test_challenge_link_uses_current_score() {
        let api = Arc::new(MockApi::with_cities(cities()));
        let mut session = playing_session(api).await;
        let answer = session.question().unwrap().correct_answer.clone();
        session.submit_answer(&answer).unwrap();

        let link = session.challenge_link().unwrap();
        assert_eq!(link.url, "http://localhost:5173/?challenger=alice");
        assert!(link.message.contains("My Score: 1 ✅ 0 ❌"));
    }

    #[tokio::test]
    async fn test_lookup_challenger() {
        let api = Arc::new(MockApi::new());
        api.insert_user(UserProfile {
            username: "bob".to_string(),
            correct: 7,
            incorrect: 2,
        })
        .await;
        let (sync, _task) = spawn_score_sync(api.clone());
        let config = SessionConfig {
            challenger: Some("bob".to_string()),
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, api, sync, seeded_random(7));

        let challenger = session.lookup_challenger().await.unwrap();
        assert_eq!(challenger.correct, 7);
        assert_eq!(session.challenger().unwrap().username, "bob");
    }

    #[tokio::test]
    async fn test_missing_challenger_is_silent() {
        let api = Arc::new(MockApi::new());
        let (sync, _task) = spawn_score_sync(api.clone());
        let config = SessionConfig {
            challenger: Some("ghost".to_string()),
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, api.clone(), sync, seeded_random(7));

        assert!(session.lookup_challenger().await.is_none());
        assert!(session.challenger().is_none());
        assert_eq!(api.calls().await, vec![ApiCall::FetchUser("ghost".to_string())]);
    }

    #[tokio::test]
    async fn test_no_challenger_param_makes_no_call() {
        let api = Arc::new(MockApi::new());
        let mut session = session_with(api.clone(), seeded_random(7));

        assert!(session.lookup_challenger().await.is_none());
        assert!(api.calls().await.is_empty());
    }
}
