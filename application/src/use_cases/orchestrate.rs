//! Orchestration Engine use case
//!
//! Turns one user message into a backend dispatch and applies the result:
//! inline replies are appended and their code blocks written to the
//! artifact store; a consensus session is handed to a
//! [`ConsensusCoordinator`] whose [`PollHandle`] goes back to the caller.

use crate::config::{Credential, TimingParams};
use crate::ports::chat_dispatch::{ChatDispatch, DispatchError, SessionStatusSource};
use crate::use_cases::consensus_coordinator::{ConsensusCoordinator, PollHandle};
use crate::use_cases::shared::Observers;
use crate::workspace::SharedWorkspace;
use codeagent_domain::{
    ChatReply, ChatRequest, ImageAttachment, Message, ModelReply, RoutingSpec, SessionToken,
    headline,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur when submitting a message
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("No API key configured")]
    NoCredential,

    #[error("No active role: enable a role and assign it a model")]
    NoActiveRole,

    #[error("A consensus session is still running")]
    SessionInFlight,

    #[error("The previous request is still being answered")]
    RequestInFlight,

    #[error("Message is empty")]
    EmptyRequest,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl SubmitError {
    /// Rejected before anything was sent or recorded
    pub fn is_precondition(&self) -> bool {
        !matches!(self, SubmitError::Dispatch(_))
    }
}

/// What a successful submit produced
pub enum SubmitOutcome {
    /// Inline replies were applied
    Replied {
        replies: usize,
        files_written: Vec<String>,
    },
    /// A consensus session is being polled; dropping the handle stops it
    SessionStarted(PollHandle),
}

impl std::fmt::Debug for SubmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitOutcome::Replied {
                replies,
                files_written,
            } => f
                .debug_struct("Replied")
                .field("replies", replies)
                .field("files_written", files_written)
                .finish(),
            SubmitOutcome::SessionStarted(handle) => f
                .debug_tuple("SessionStarted")
                .field(&handle.token().as_str())
                .finish(),
        }
    }
}

/// Use case for dispatching user messages
pub struct OrchestrationEngine {
    workspace: SharedWorkspace,
    dispatch: Arc<dyn ChatDispatch>,
    status: Arc<dyn SessionStatusSource>,
    observers: Observers,
    timing: TimingParams,
}

impl OrchestrationEngine {
    pub fn new(
        workspace: SharedWorkspace,
        dispatch: Arc<dyn ChatDispatch>,
        status: Arc<dyn SessionStatusSource>,
    ) -> Self {
        Self {
            workspace,
            dispatch,
            status,
            observers: Observers::default(),
            timing: TimingParams::default(),
        }
    }

    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    pub fn with_timing(mut self, timing: TimingParams) -> Self {
        self.timing = timing;
        self
    }

    pub fn workspace(&self) -> &SharedWorkspace {
        &self.workspace
    }

    /// Dispatch `text` (and an optional image) to the active roles.
    ///
    /// Precondition failures return before anything is recorded. Once the
    /// user message is appended, a failed call adds exactly one error
    /// notice and leaves the artifacts untouched.
    pub async fn submit(
        &self,
        text: &str,
        image: Option<ImageAttachment>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let (request, credential, changes) = self.workspace.update(|ws| {
            let credential = ws
                .settings()
                .usable_credential()
                .cloned()
                .ok_or(SubmitError::NoCredential)?;
            if !ws.roles().has_active_role() {
                return Err(SubmitError::NoActiveRole);
            }
            if ws.is_polling() {
                return Err(SubmitError::SessionInFlight);
            }
            if ws.is_generating() {
                return Err(SubmitError::RequestInFlight);
            }
            if text.trim().is_empty() {
                return Err(SubmitError::EmptyRequest);
            }

            let request = ChatRequest {
                message: text.to_string(),
                routing: RoutingSpec::from_registry(ws.roles(), ws.settings().routing_mode),
                history: ws.conversation().history(),
                image: image.clone(),
                mode: ws.settings().dispatch_mode,
            };
            let changes = ws.begin_turn(Message::user_with_image(text, image));
            Ok::<_, SubmitError>((request, credential, changes))
        })?;
        self.observers.publish(&changes);

        info!(
            "Dispatching '{}' to {} model slot(s) ({:?})",
            headline(text, 60),
            request.routing.models().len(),
            request.mode
        );
        debug!("History carries {} turn(s)", request.history.len());

        match self.dispatch_request(&request, &credential).await {
            Ok(ChatReply::Direct(replies)) => Ok(self.apply_direct(replies)),
            Ok(ChatReply::Session(token)) => Ok(self.start_session(token)),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn dispatch_request(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, DispatchError> {
        self.dispatch.dispatch(request, credential).await
    }

    fn apply_direct(&self, replies: Vec<ModelReply>) -> SubmitOutcome {
        let count = replies.len();
        if count == 0 {
            warn!("Backend returned no replies");
        }
        let changes = self.workspace.update(|ws| ws.apply_replies(replies));
        self.observers.publish(&changes);
        info!(
            "Applied {} reply(ies); {} file(s) written",
            count,
            changes.files_written.len()
        );
        SubmitOutcome::Replied {
            replies: count,
            files_written: changes.files_written,
        }
    }

    fn start_session(&self, token: SessionToken) -> SubmitOutcome {
        info!("Consensus session {} opened", token);
        let cancel = CancellationToken::new();
        let changes = self
            .workspace
            .update(|ws| ws.begin_session(token.clone(), cancel.clone()));
        self.observers.publish(&changes);

        let handle = ConsensusCoordinator::new(
            self.workspace.clone(),
            Arc::clone(&self.status),
            token,
            cancel,
        )
        .with_observers(self.observers.clone())
        .with_tick_timeout(self.timing.tick_timeout)
        .spawn(self.timing.poll_interval);
        SubmitOutcome::SessionStarted(handle)
    }

    fn fail(&self, error: DispatchError) -> SubmitError {
        warn!("Dispatch failed: {}", error);
        let changes = self
            .workspace
            .update(|ws| ws.record_failure(format!("Request failed: {error}")));
        self.observers.publish(&changes);
        SubmitError::Dispatch(error)
    }
}
