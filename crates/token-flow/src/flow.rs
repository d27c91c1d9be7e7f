//! Token exchange flow driver
//!
//! Runs the state machine from `state.rs` against the injected
//! collaborators. Each `execute()` is one user-triggered operation: it ends
//! with exactly one of a document write plus success notice, an AAD error
//! notice, a client error notice, or a raw exception notice. No error
//! escapes `execute()`.
//!
//! The flow holds no per-invocation state, so concurrent invocations are
//! independent and are not deduplicated.

use std::sync::Arc;
use std::time::Instant;

use host::{
    AadErrorHandler, ClientErrorHandler, DocumentWriter, HostAuthProvider, Notifier,
    TokenExchangeService,
};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::metrics;
use crate::state::{FlowAction, FlowEvent, FlowState, Outcome, handle_event};

/// Everything the flow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub auth: Arc<dyn HostAuthProvider>,
    pub exchange: Arc<dyn TokenExchangeService>,
    pub document: Arc<dyn DocumentWriter>,
    pub notifier: Arc<dyn Notifier>,
    pub aad_errors: Arc<dyn AadErrorHandler>,
    pub client_errors: Arc<dyn ClientErrorHandler>,
}

/// Fetches downstream data and writes it into the document.
#[derive(Clone)]
pub struct TokenExchangeFlow {
    collaborators: Collaborators,
}

impl TokenExchangeFlow {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Run one invocation to completion and report how it ended.
    ///
    /// Results are surfaced through the collaborators; the returned
    /// `Outcome` is for logging and exit codes only.
    pub async fn execute(&self) -> Outcome {
        let invocation_id = Uuid::new_v4();
        self.run()
            .instrument(info_span!("token_flow", %invocation_id))
            .await
    }

    async fn run(&self) -> Outcome {
        let c = &self.collaborators;
        let started = Instant::now();
        let (mut state, mut action) = handle_event(FlowState::Idle, FlowEvent::Started);

        loop {
            debug!(state = state.name(), "flow state");
            let event = match action {
                FlowAction::RequestBootstrapToken(options) => {
                    if options.auth_challenge.is_some() {
                        info!("claims challenge received, requesting step-up token");
                        metrics::record_claims_challenge();
                    }
                    match c.auth.get_access_token(&options).await {
                        Ok(token) => FlowEvent::BootstrapTokenIssued(token),
                        Err(e) => FlowEvent::Failed(e),
                    }
                }
                FlowAction::Exchange(token) => match c.exchange.exchange(&token).await {
                    Ok(response) => {
                        debug!(response = response.kind(), "exchange completed");
                        FlowEvent::ExchangeCompleted(response)
                    }
                    Err(e) => FlowEvent::Failed(e),
                },
                FlowAction::CallApi(access_token) => {
                    match c.exchange.call_api(&access_token).await {
                        Ok(data) => FlowEvent::ApiResultReceived(data),
                        Err(e) => FlowEvent::Failed(e),
                    }
                }
                FlowAction::WriteDocument(data) => match c.document.write(&data) {
                    Ok(()) => FlowEvent::DocumentWritten,
                    Err(e) => FlowEvent::Failed(e),
                },
                FlowAction::HandleAadError(error) => {
                    c.aad_errors.handle(&error);
                    break;
                }
                FlowAction::HandleClientError(error) => {
                    c.client_errors.handle(&error);
                    break;
                }
                FlowAction::Notify(message) => {
                    c.notifier.show(&message);
                    break;
                }
                FlowAction::None => break,
            };
            (state, action) = handle_event(state, event);
        }

        // Every terminal action is emitted together with a terminal state
        let outcome = state.outcome().unwrap_or(Outcome::UnknownError);
        metrics::record_outcome(outcome, started.elapsed());
        info!(
            outcome = outcome.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "flow finished"
        );
        outcome
    }
}
