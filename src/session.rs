//! Conversation session management.
//!
//! A `Session` owns the ordered transcript and mediates at most one chat
//! round-trip at a time. Failures never escape: every settled request lands
//! exactly one assistant turn, either the reply or [`FALLBACK_REPLY`].
//!
//! `reset()` does not cancel an outstanding request. By default a reply that
//! settles after a reset is dropped, so a cleared conversation stays empty.
//! [`Session::with_keep_orphaned_replies`] appends it to the new log instead.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::chat::{ChatBackend, ChatError, FALLBACK_REPLY};
use crate::creativity::Creativity;
use crate::state::{Speaker, Turn};

/// The single outstanding request, tagged with the epoch it was issued in.
struct InFlight {
    epoch: u64,
    task: JoinHandle<Result<String, ChatError>>,
}

pub struct Session {
    turns: Vec<Turn>,
    /// Text staged in the input box, cleared when it is submitted.
    input: String,
    creativity: Creativity,
    backend: Arc<dyn ChatBackend>,
    in_flight: Option<InFlight>,
    /// Bumped by `reset()` so late replies can be recognised.
    epoch: u64,
    /// Append replies that arrive after a reset instead of dropping them.
    keep_orphaned_replies: bool,
}

impl Session {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            turns: Vec::new(),
            input: String::new(),
            creativity: Creativity::default(),
            backend,
            in_flight: None,
            epoch: 0,
            keep_orphaned_replies: false,
        }
    }

    pub fn with_creativity(mut self, creativity: Creativity) -> Self {
        self.creativity = creativity;
        self
    }

    pub fn with_keep_orphaned_replies(mut self, keep: bool) -> Self {
        self.keep_orphaned_replies = keep;
        self
    }

    /// Append the user's turn and start the round-trip in the background.
    ///
    /// Silently ignored (returns `false`) when `text` is blank or a request is
    /// already outstanding.
    pub fn submit(&mut self, text: &str, creativity: Creativity) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if self.is_pending() {
            debug!("Submission ignored, a request is already in flight");
            return false;
        }

        self.push_turn(Speaker::User, text);
        self.input.clear();

        let backend = Arc::clone(&self.backend);
        let message = text.to_string();
        let epoch = self.epoch;
        debug!(epoch, temperature = creativity.as_str(), "Dispatching chat request");

        self.in_flight = Some(InFlight {
            epoch,
            task: tokio::spawn(async move { backend.reply(&message, creativity).await }),
        });
        true
    }

    /// Submit whatever is staged in the input buffer at the current creativity.
    pub fn submit_staged(&mut self) -> bool {
        let text = self.input.clone();
        self.submit(&text, self.creativity)
    }

    /// Append a fixed assistant message without touching the network.
    pub fn inject_canned_message(&mut self, text: &str) {
        self.push_turn(Speaker::Assistant, text);
    }

    /// Clear the transcript and staged input. An in-flight request keeps
    /// running and still clears `pending` when it settles.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.input.clear();
        self.epoch += 1;
        debug!(epoch = self.epoch, "Session reset");
    }

    /// Settle the outstanding request if its task has already finished.
    /// Returns `true` when a request was settled.
    pub async fn poll_reply(&mut self) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.task.is_finished());
        if !finished {
            return false;
        }
        self.settle().await
    }

    /// Wait for the outstanding request, if any, and settle it.
    pub async fn settle(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };
        let outcome = in_flight.task.await;
        self.land_reply(in_flight.epoch, outcome);
        true
    }

    fn land_reply(&mut self, epoch: u64, outcome: Result<Result<String, ChatError>, JoinError>) {
        let text = match outcome {
            Ok(Ok(reply)) if !reply.trim().is_empty() => reply,
            Ok(Ok(_)) => {
                warn!("Chat reply was empty, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Ok(Err(e)) => {
                warn!("Chat request failed: {e}");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                warn!("Chat task did not complete: {e}");
                FALLBACK_REPLY.to_string()
            }
        };

        if epoch != self.epoch && !self.keep_orphaned_replies {
            debug!(epoch, current = self.epoch, "Dropping reply from before reset");
            return;
        }

        self.push_turn(Speaker::Assistant, text);
    }

    fn push_turn(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.push_turn_at(speaker, text, Local::now());
    }

    /// Timestamps never go backwards, even if the wall clock does.
    fn push_turn_at(&mut self, speaker: Speaker, text: impl Into<String>, now: DateTime<Local>) {
        let created_at = match self.turns.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        };
        self.turns.push(Turn::new(speaker, text, created_at));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn creativity(&self) -> Creativity {
        self.creativity
    }

    pub fn set_creativity(&mut self, creativity: Creativity) {
        self.creativity = creativity;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
