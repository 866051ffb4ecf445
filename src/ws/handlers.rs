//! WebSocket message dispatch
//!
//! Each connection owns one [`Session`]. Handlers mutate it and push the
//! resulting server messages to the connection's outbox; a closed outbox
//! only means the client went away.

use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{Session, SessionError};
use crate::types::SessionPhase;

/// Messages queued for one client
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Queue `msg`; false when the socket already closed
fn send(out: &Outbox, msg: ServerMessage) -> bool {
    match out.send(msg) {
        Ok(()) => true,
        Err(mpsc::error::SendError(msg)) => {
            tracing::debug!("Outbox closed, dropping {:?}", msg);
            false
        }
    }
}

fn send_error(out: &Outbox, e: &SessionError) {
    send(out, ServerMessage::error(e.code(), e.to_string()));
}

/// Handle one client message
pub async fn handle_message(msg: ClientMessage, session: &mut Session, out: &Outbox) {
    match msg {
        ClientMessage::Register { username } => handle_register(session, username, out).await,
        ClientMessage::Answer { choice } => handle_answer(session, choice, out),
        ClientMessage::NextQuestion => handle_next_question(session, out),
        ClientMessage::Challenge => handle_challenge(session, out),
    }
}

/// Greet a new connection and show the challenger banner if one was linked
pub async fn handle_connect(session: &mut Session, out: &Outbox) {
    send(
        out,
        ServerMessage::Welcome {
            protocol: crate::protocol::PROTOCOL_VERSION.to_string(),
            session_id: session.id().to_string(),
            server_now: chrono::Utc::now().to_rfc3339(),
        },
    );

    if let Some(profile) = session.lookup_challenger().await {
        send(
            out,
            ServerMessage::Challenger {
                profile: profile.clone(),
            },
        );
    }
}

pub async fn handle_register(session: &mut Session, username: String, out: &Outbox) {
    tracing::info!("Registration request: {}", username);

    if let Err(e) = session.register(&username).await {
        send(
            out,
            ServerMessage::RegistrationFailed {
                code: e.code().to_string(),
                msg: e.to_string(),
            },
        );
        return;
    }

    send(
        out,
        ServerMessage::Registered {
            username: session.username().to_string(),
        },
    );
    send(
        out,
        ServerMessage::Score {
            score: session.score(),
        },
    );
    send(out, ServerMessage::Loading);

    match session.load_catalog().await {
        Ok(card) => {
            send(out, ServerMessage::Question { card });
        }
        Err(e) => send_error(out, &e),
    }
}

pub fn handle_answer(session: &mut Session, choice: String, out: &Outbox) {
    match session.submit_answer(&choice) {
        Ok(feedback) => {
            let score = feedback.score;
            send(out, ServerMessage::AnswerResult { feedback });
            send(out, ServerMessage::Score { score });
        }
        // Input is locked after the first answer; repeats are dropped quietly
        Err(SessionError::AlreadyAnswered) => {
            tracing::debug!("Session {} ignored repeated answer {}", session.id(), choice);
        }
        Err(e) => send_error(out, &e),
    }
}

pub fn handle_next_question(session: &mut Session, out: &Outbox) {
    if session.phase() == SessionPhase::Loading {
        send(out, ServerMessage::Loading);
        return;
    }

    match session.next_question() {
        Ok(card) => {
            send(out, ServerMessage::Question { card });
        }
        Err(e) => send_error(out, &e),
    }
}

pub fn handle_challenge(session: &mut Session, out: &Outbox) {
    match session.challenge_link() {
        Ok(link) => {
            tracing::info!("Challenge link created for {}", session.username());
            if !send(out, ServerMessage::ChallengeLink { link }) {
                tracing::warn!(
                    "Challenge link for {} not delivered, connection closed",
                    session.username()
                );
            }
        }
        Err(e) => send_error(out, &e),
    }
}
