use crate::challenge::ChallengeLink;
use crate::session::{AnswerFeedback, QuestionCard};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Version string sent in the welcome message
pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    Register {
        username: String,
    },
    Answer {
        choice: String,
    },
    NextQuestion,
    /// Ask for a shareable challenge link for the current score
    Challenge,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        session_id: SessionId,
        server_now: String,
    },
    /// Profile of the player who shared the link this session was opened from
    Challenger {
        profile: UserProfile,
    },
    Registered {
        username: Username,
    },
    RegistrationFailed {
        code: String,
        msg: String,
    },
    /// Cities are being fetched; the client shows a placeholder card
    Loading,
    Question {
        #[serde(flatten)]
        card: QuestionCard,
    },
    AnswerResult {
        #[serde(flatten)]
        feedback: AnswerFeedback,
    },
    Score {
        score: Score,
    },
    ChallengeLink {
        #[serde(flatten)]
        link: ChallengeLink,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}
