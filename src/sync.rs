//! Background score synchronization
//!
//! Sessions enqueue one [`ScoreUpdate`] per score change and move on. A single
//! worker drains the queue in order and patches the backend. Each update is
//! sent once: failures are logged and dropped, later updates carry the full
//! score so the backend converges on the newest value.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::QuizApi;
use crate::types::{Score, Username};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdate {
    pub username: Username,
    pub score: Score,
}

/// Sending side of the score-sync queue; cheap to clone per session
#[derive(Debug, Clone)]
pub struct ScoreSyncHandle {
    tx: mpsc::UnboundedSender<ScoreUpdate>,
}

impl ScoreSyncHandle {
    /// Queue an update. Returns false if the worker has stopped.
    pub fn push(&self, username: &str, score: Score) -> bool {
        let update = ScoreUpdate {
            username: username.to_string(),
            score,
        };
        match self.tx.send(update) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Score sync worker gone, dropping update for {}", e.0.username);
                false
            }
        }
    }
}

/// Spawn the worker that pushes queued scores to the backend.
///
/// The worker exits once every handle has been dropped and the queue is
/// drained; awaiting the returned `JoinHandle` then observes full delivery.
pub fn spawn_score_sync(api: Arc<dyn QuizApi>) -> (ScoreSyncHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ScoreUpdate>();

    let task = tokio::spawn(async move {
        let mut sent = 0u64;
        let mut failed = 0u64;

        while let Some(update) = rx.recv().await {
            match api.update_score(&update.username, update.score).await {
                Ok(()) => {
                    sent += 1;
                    tracing::debug!(
                        "Synced score for {}: {} correct, {} incorrect",
                        update.username,
                        update.score.correct,
                        update.score.incorrect
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Score sync failed for {}: {}", update.username, e);
                }
            }
        }

        tracing::info!(
            "Score sync worker stopped ({} sent, {} failed, via {})",
            sent,
            failed,
            api.name()
        );
    });

    (ScoreSyncHandle { tx }, task)
}
