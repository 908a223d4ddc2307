//! UI-agnostic session state
//!
//! A `Session` is everything one open client window knows: the selected mode,
//! the connectivity indicator, the single in-flight request, the dive-deeper
//! dialog, and the text currently shown to the user. The UI owns one session,
//! feeds it user actions and network results, and renders from its getters.
//!
//! Network calls happen outside the session. `send_query` and `accept_dive`
//! hand out a [`Dispatch`], and only while no other request is in flight.
//! Whoever performs the request gives the dispatch back through
//! [`Session::complete`] together with the result.

use tracing::{debug, info, warn};

use crate::connectivity::Connectivity;
use crate::error::ApiError;
use crate::interpreter::{interpret, Outcome};
use crate::offline::offline_fallback;
use crate::protocol::{Query, Response};

pub const THINKING: &str = "Thinking...";
pub const DECLINED: &str = "Understood. I'll stick with what I have for now.";

pub type RequestId = u64;

/// A request the caller must send and then report back via `complete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub id: RequestId,
    pub query: Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    Idle,
    Thinking,
    Answer,
    Clarify,
    Error,
    Offline,
    Notice,
}

/// The single output region
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Output {
    pub kind: OutputKind,
    pub text: String,
}

impl Output {
    fn new(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Hidden,
    Shown {
        prompt: String,
    },
}

impl Dialog {
    pub fn is_shown(&self) -> bool {
        matches!(self, Dialog::Shown { .. })
    }
}

#[derive(Debug, Default)]
pub struct Session {
    mode: String,
    connectivity: Connectivity,
    in_flight: Option<RequestId>,
    next_id: RequestId,
    last_user_text: Option<String>,
    pending_dive: Option<String>,
    dialog: Dialog,
    output: Output,
}

impl Session {
    pub fn new(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: &str) {
        self.mode = mode.to_string();
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn set_connectivity(&mut self, state: Connectivity) {
        self.connectivity = state;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn pending_dive(&self) -> Option<&str> {
        self.pending_dive.as_deref()
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.last_user_text.as_deref()
    }

    /// Submit what the user typed.
    ///
    /// Returns `None`, leaving the session untouched, when the trimmed input is
    /// empty or a request is already in flight. The caller clears its input
    /// field only when a dispatch comes back.
    pub fn send_query(&mut self, input: &str) -> Option<Dispatch> {
        let text = input.trim();
        if text.is_empty() || self.is_busy() {
            return None;
        }

        self.last_user_text = Some(text.to_string());
        self.output = Output::new(OutputKind::Thinking, THINKING);
        Some(self.post(text, false))
    }

    /// Start a request for `text` with the current mode and mark the session
    /// busy. Callers must check `is_busy` first.
    fn post(&mut self, text: &str, dive_confirmed: bool) -> Dispatch {
        self.next_id += 1;
        let id = self.next_id;
        self.in_flight = Some(id);

        debug!(id, dive_confirmed, "request started");
        Dispatch {
            id,
            query: Query::new(text, dive_confirmed, &self.mode),
        }
    }

    /// Apply the result of a dispatched request.
    ///
    /// The busy state is released before anything else, so every outcome
    /// (answer, backend error, offline fallback, dive prompt) leaves the
    /// session ready for the next submission.
    pub fn complete(&mut self, dispatch: Dispatch, result: Result<Response, ApiError>) {
        if self.in_flight != Some(dispatch.id) {
            warn!(id = dispatch.id, "ignoring result for a request that is not in flight");
            return;
        }
        self.in_flight = None;

        let text = dispatch.query.text;
        match result {
            Ok(response) => self.apply(interpret(&response), text),
            Err(e) => {
                warn!("backend unreachable, answering offline: {}", e);
                self.output = Output::new(OutputKind::Offline, offline_fallback(&text));
                if self.connectivity != Connectivity::Offline {
                    info!("backend is {}", Connectivity::Offline.label());
                }
                self.connectivity = Connectivity::Offline;
            }
        }
    }

    fn apply(&mut self, outcome: Outcome, original_text: String) {
        let text = outcome.display_text();
        match outcome {
            Outcome::Answer(_) => self.output = Output::new(OutputKind::Answer, text),
            Outcome::Clarify(_) => self.output = Output::new(OutputKind::Clarify, text),
            Outcome::Error(_) | Outcome::Unexpected => {
                self.output = Output::new(OutputKind::Error, text)
            }
            Outcome::ConfirmDive(prompt) => {
                self.pending_dive = Some(original_text);
                self.dialog = Dialog::Shown { prompt };
                // Nothing is being computed while the question waits on the user
                self.output = Output::default();
            }
        }
    }

    /// The user agreed to dig deeper: resend the pending text with
    /// `dive_confirmed` set.
    ///
    /// Does nothing while the dialog is hidden or another request is in flight.
    pub fn accept_dive(&mut self) -> Option<Dispatch> {
        if !self.dialog.is_shown() || self.is_busy() {
            return None;
        }

        self.dialog = Dialog::Hidden;
        let text = self.pending_dive.take()?;
        self.output = Output::new(OutputKind::Thinking, THINKING);
        Some(self.post(&text, true))
    }

    pub fn decline_dive(&mut self) {
        if !self.dialog.is_shown() {
            return;
        }

        self.dialog = Dialog::Hidden;
        self.pending_dive = None;
        self.output = Output::new(OutputKind::Notice, DECLINED);
    }
}
