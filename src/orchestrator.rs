//! Conversation orchestrator
//!
//! Owns the transcript and the request gate, dispatches questions and
//! diagnosis requests to an [`AssistantBackend`], and reports every
//! transcript mutation to subscribers.
//!
//! A dispatch always runs the same bracket: acquire the gate, show the typing
//! placeholder, await the backend, hide the placeholder, append the result,
//! release the gate, then signal scroll-to-end. Requests made while the gate
//! is held are dropped without touching the transcript.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::api::{AskQuery, AssistantBackend, ReplyPayload};
use crate::error::{DispatchError, DispatchOutcome, SkipReason};
use crate::format::format;
use crate::gate::{GateGuard, RequestGate};
use crate::placeholder;
use crate::state::{AssistantEvent, MessageEntry, DIAGNOSIS_PREFIX, GREETING};
use crate::transcript::Transcript;

type Subscriber = Box<dyn Fn(&AssistantEvent) + Send + Sync>;

pub struct Assistant<B> {
    backend: B,
    transcript: Mutex<Transcript>,
    gate: RequestGate,
    subscribers: Mutex<Vec<Subscriber>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: AssistantBackend> Assistant<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            transcript: Mutex::new(Transcript::with_entries(Self::initial_messages())),
            gate: RequestGate::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// The entries every conversation starts with: the greeting.
    pub fn initial_messages() -> Vec<MessageEntry> {
        vec![MessageEntry::info(GREETING)]
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn messages(&self) -> Vec<MessageEntry> {
        lock(&self.transcript).snapshot()
    }

    /// Whether a request is in flight. Hosts disable both triggers while true.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Register a callback for transcript changes and scroll requests.
    ///
    /// Callbacks run on the dispatching task after the transcript lock is
    /// released. They may read `messages()` but must not call `subscribe`.
    pub fn subscribe<F>(&self, on_change: F)
    where
        F: Fn(&AssistantEvent) + Send + Sync + 'static,
    {
        lock(&self.subscribers).push(Box::new(on_change));
    }

    pub async fn submit_question(&self, text: &str) -> DispatchOutcome {
        if text.trim().is_empty() {
            debug!("Ignoring empty question");
            return DispatchOutcome::Skipped(SkipReason::EmptyInput);
        }

        let Some(mut dispatch) = self.begin() else {
            debug!("Dropping question, a request is already in flight");
            return DispatchOutcome::Skipped(SkipReason::Busy);
        };

        self.mutate(|t| t.append(MessageEntry::user(text)));
        dispatch.show_typing();

        debug!("Sending question ({} chars)", text.chars().count());
        let query = AskQuery {
            question: text.to_string(),
        };
        let result = settle(self.backend.ask(&query)).await;

        dispatch.hide_typing();
        let outcome = match result {
            Ok(reply) => {
                let sources = reply.sources.as_ref().map_or(0, Vec::len);
                info!("Question answered with {} sources", sources);
                let content = format(&ReplyPayload::Answer(reply));
                self.mutate(|t| t.append(MessageEntry::answer(content)));
                DispatchOutcome::Answered
            }
            Err(e) => self.fail("question", e),
        };

        drop(dispatch);
        self.notify(&AssistantEvent::ScrollToEnd);
        outcome
    }

    pub async fn request_diagnosis(&self) -> DispatchOutcome {
        let Some(mut dispatch) = self.begin() else {
            debug!("Dropping diagnosis request, a request is already in flight");
            return DispatchOutcome::Skipped(SkipReason::Busy);
        };

        dispatch.show_typing();

        debug!("Requesting diagnosis");
        let result = settle(self.backend.diagnose()).await;

        dispatch.hide_typing();
        let outcome = match result {
            Ok(reply) => {
                info!("Diagnosis received");
                let content = format!(
                    "{}{}",
                    DIAGNOSIS_PREFIX,
                    format(&ReplyPayload::Diagnosis(reply))
                );
                self.mutate(|t| t.append(MessageEntry::diagnosis(content)));
                DispatchOutcome::Diagnosed
            }
            Err(e) => self.fail("diagnosis", e),
        };

        drop(dispatch);
        self.notify(&AssistantEvent::ScrollToEnd);
        outcome
    }

    fn begin(&self) -> Option<Dispatch<'_, B>> {
        let gate = self.gate.acquire()?;
        Some(Dispatch {
            assistant: self,
            typing: false,
            _gate: gate,
        })
    }

    fn fail(&self, request: &str, error: DispatchError) -> DispatchOutcome {
        warn!("{} request failed: {}", request, error);
        self.mutate(|t| t.append(MessageEntry::server_error()));
        DispatchOutcome::Failed
    }

    fn mutate(&self, f: impl FnOnce(&mut Transcript)) {
        let snapshot = {
            let mut transcript = lock(&self.transcript);
            f(&mut transcript);
            transcript.snapshot()
        };
        self.notify(&AssistantEvent::Changed(snapshot));
    }

    fn notify(&self, event: &AssistantEvent) {
        for subscriber in lock(&self.subscribers).iter() {
            subscriber(event);
        }
    }
}

/// One in-flight request: holds the gate and owns the typing placeholder.
///
/// Dropping it hides the placeholder and then releases the gate, so a
/// cancelled dispatch future or an unwinding subscriber never leaves a typing
/// entry behind an idle gate.
struct Dispatch<'a, B: AssistantBackend> {
    assistant: &'a Assistant<B>,
    typing: bool,
    // Declared last: released after `drop` has hidden the placeholder
    _gate: GateGuard<'a>,
}

impl<B: AssistantBackend> Dispatch<'_, B> {
    fn show_typing(&mut self) {
        self.typing = true;
        self.assistant.mutate(placeholder::show);
    }

    fn hide_typing(&mut self) {
        if std::mem::take(&mut self.typing) {
            self.assistant.mutate(placeholder::hide);
        }
    }
}

impl<B: AssistantBackend> Drop for Dispatch<'_, B> {
    fn drop(&mut self) {
        if !std::mem::take(&mut self.typing) {
            return;
        }
        if std::thread::panicking() {
            // A subscriber may be what is unwinding; do not call back into it
            placeholder::hide(&mut lock(&self.assistant.transcript));
        } else {
            debug!("Dispatch cancelled before it settled");
            self.assistant.mutate(placeholder::hide);
        }
    }
}

/// Await a backend call, turning a panic inside it into a dispatch failure.
async fn settle<T>(call: impl Future<Output = Result<T, DispatchError>>) -> Result<T, DispatchError> {
    AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(DispatchError::Panicked))
}
