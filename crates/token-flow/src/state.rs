//! Flow state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! The driver in `flow.rs` performs the collaborator call implied by each
//! action and feeds the result back as the next event.
//!
//! ```text
//! Idle → AwaitingBootstrapToken → Exchanging
//!      → [ChallengeRetry → ReExchanging]?
//!      → CallingApi → WritingDocument
//!      → {Success | AadError | ClientError | UnknownError}
//! ```
//!
//! At most one step-up retry happens: a second claims challenge is not
//! followed, it terminates the flow as an identity-service error.

use host::{
    AadError, AccessToken, BootstrapToken, ClientError, ExchangeResponse, HostError, TokenOptions,
};

/// Shown after the payload has been written.
pub const SUCCESS_MESSAGE: &str = "Your data has been added to the document.";

/// Flow states. The last four are terminal and absorb every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingBootstrapToken,
    Exchanging,
    /// Waiting for the step-up bootstrap token
    ChallengeRetry { claims: String },
    /// Exchanging the step-up token; no further challenge is followed
    ReExchanging,
    CallingApi,
    WritingDocument,
    Success,
    AadError,
    ClientError,
    UnknownError,
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::AwaitingBootstrapToken => "awaiting_bootstrap_token",
            FlowState::Exchanging => "exchanging",
            FlowState::ChallengeRetry { .. } => "challenge_retry",
            FlowState::ReExchanging => "re_exchanging",
            FlowState::CallingApi => "calling_api",
            FlowState::WritingDocument => "writing_document",
            FlowState::Success => "success",
            FlowState::AadError => "aad_error",
            FlowState::ClientError => "client_error",
            FlowState::UnknownError => "unknown_error",
        }
    }

    /// Terminal outcome, or `None` while the flow is still running.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            FlowState::Success => Some(Outcome::Success),
            FlowState::AadError => Some(Outcome::AadError),
            FlowState::ClientError => Some(Outcome::ClientError),
            FlowState::UnknownError => Some(Outcome::UnknownError),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AadError,
    ClientError,
    UnknownError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::AadError => "aad_error",
            Outcome::ClientError => "client_error",
            Outcome::UnknownError => "unknown_error",
        }
    }
}

/// Events that drive state transitions
#[derive(Debug)]
pub enum FlowEvent {
    /// User triggered the operation
    Started,
    /// Host issued a bootstrap token
    BootstrapTokenIssued(BootstrapToken),
    /// Exchange call returned
    ExchangeCompleted(ExchangeResponse),
    /// Downstream API returned its payload
    ApiResultReceived(serde_json::Value),
    /// Payload persisted into the document
    DocumentWritten,
    /// Any collaborator call failed
    Failed(HostError),
}

/// Actions the driver should execute after a transition
#[derive(Debug)]
pub enum FlowAction {
    RequestBootstrapToken(TokenOptions),
    Exchange(BootstrapToken),
    CallApi(AccessToken),
    WriteDocument(serde_json::Value),
    HandleAadError(AadError),
    HandleClientError(ClientError),
    Notify(String),
    /// Nothing left to do
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: FlowState, event: FlowEvent) -> (FlowState, FlowAction) {
    match (state, event) {
        // --- Terminal states absorb everything ---
        (state, _) if state.is_terminal() => (state, FlowAction::None),

        // --- Idle ---
        (FlowState::Idle, FlowEvent::Started) => (
            FlowState::AwaitingBootstrapToken,
            FlowAction::RequestBootstrapToken(TokenOptions::initial()),
        ),

        // --- Bootstrap token issued ---
        (FlowState::AwaitingBootstrapToken, FlowEvent::BootstrapTokenIssued(token)) => {
            (FlowState::Exchanging, FlowAction::Exchange(token))
        }
        (FlowState::ChallengeRetry { .. }, FlowEvent::BootstrapTokenIssued(token)) => {
            (FlowState::ReExchanging, FlowAction::Exchange(token))
        }

        // --- Exchange results ---
        (
            FlowState::Exchanging,
            FlowEvent::ExchangeCompleted(ExchangeResponse::ChallengeRequired { claims }),
        ) => (
            FlowState::ChallengeRetry {
                claims: claims.clone(),
            },
            FlowAction::RequestBootstrapToken(TokenOptions::challenge(claims)),
        ),
        (
            FlowState::ReExchanging,
            FlowEvent::ExchangeCompleted(ExchangeResponse::ChallengeRequired { .. }),
        ) => (
            FlowState::AadError,
            FlowAction::HandleAadError(repeated_challenge()),
        ),
        (
            FlowState::Exchanging | FlowState::ReExchanging,
            FlowEvent::ExchangeCompleted(ExchangeResponse::Success { access_token }),
        ) => (FlowState::CallingApi, FlowAction::CallApi(access_token)),
        (
            FlowState::Exchanging | FlowState::ReExchanging,
            FlowEvent::ExchangeCompleted(ExchangeResponse::Failed(error)),
        ) => (FlowState::AadError, FlowAction::HandleAadError(error)),

        // --- Result branch ---
        (FlowState::CallingApi, FlowEvent::ApiResultReceived(data)) => {
            (FlowState::WritingDocument, FlowAction::WriteDocument(data))
        }
        (FlowState::WritingDocument, FlowEvent::DocumentWritten) => (
            FlowState::Success,
            FlowAction::Notify(SUCCESS_MESSAGE.to_string()),
        ),

        // --- Failures from any running state ---
        (_, FlowEvent::Failed(HostError::Client(error))) => {
            (FlowState::ClientError, FlowAction::HandleClientError(error))
        }
        (_, FlowEvent::Failed(HostError::Unclassified(message))) => (
            FlowState::UnknownError,
            FlowAction::Notify(exception_message(&message)),
        ),

        // --- Out-of-order event: end the flow rather than stall it ---
        (state, event) => (
            FlowState::UnknownError,
            FlowAction::Notify(exception_message(&format!(
                "unexpected event {} in state {}",
                event_name(&event),
                state.name()
            ))),
        ),
    }
}

/// User-facing text for an unclassified failure: the error serialized as JSON.
pub fn exception_message(message: &str) -> String {
    format!("EXCEPTION: {}", serde_json::json!({ "message": message }))
}

/// A challenge on the step-up exchange is reported, not followed.
fn repeated_challenge() -> AadError {
    AadError::new(
        "interaction_required",
        "claims challenge repeated after step-up authentication",
    )
}

fn event_name(event: &FlowEvent) -> &'static str {
    match event {
        FlowEvent::Started => "started",
        FlowEvent::BootstrapTokenIssued(_) => "bootstrap_token_issued",
        FlowEvent::ExchangeCompleted(_) => "exchange_completed",
        FlowEvent::ApiResultReceived(_) => "api_result_received",
        FlowEvent::DocumentWritten => "document_written",
        FlowEvent::Failed(_) => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(claims: &str) -> FlowEvent {
        FlowEvent::ExchangeCompleted(ExchangeResponse::ChallengeRequired {
            claims: claims.into(),
        })
    }

    fn success(token: &str) -> FlowEvent {
        FlowEvent::ExchangeCompleted(ExchangeResponse::Success {
            access_token: AccessToken::new(token),
        })
    }

    #[test]
    fn idle_requests_initial_token() {
        let (state, action) = handle_event(FlowState::Idle, FlowEvent::Started);
        assert_eq!(state, FlowState::AwaitingBootstrapToken);
        match action {
            FlowAction::RequestBootstrapToken(options) => {
                assert_eq!(options, TokenOptions::initial())
            }
            other => panic!("expected RequestBootstrapToken, got {other:?}"),
        }
    }

    #[test]
    fn issued_token_is_exchanged() {
        let (state, action) = handle_event(
            FlowState::AwaitingBootstrapToken,
            FlowEvent::BootstrapTokenIssued(BootstrapToken::new("T1")),
        );
        assert_eq!(state, FlowState::Exchanging);
        assert!(matches!(action, FlowAction::Exchange(ref t) if t.expose() == "T1"));
    }

    #[test]
    fn first_challenge_requests_step_up_token() {
        let (state, action) = handle_event(FlowState::Exchanging, challenge("C1"));
        assert_eq!(
            state,
            FlowState::ChallengeRetry {
                claims: "C1".into()
            }
        );
        match action {
            FlowAction::RequestBootstrapToken(options) => {
                assert_eq!(options, TokenOptions::challenge("C1"));
                assert!(!options.allow_sign_in_prompt);
            }
            other => panic!("expected RequestBootstrapToken, got {other:?}"),
        }
    }

    #[test]
    fn step_up_token_is_re_exchanged() {
        let (state, action) = handle_event(
            FlowState::ChallengeRetry {
                claims: "C1".into(),
            },
            FlowEvent::BootstrapTokenIssued(BootstrapToken::new("T2")),
        );
        assert_eq!(state, FlowState::ReExchanging);
        assert!(matches!(action, FlowAction::Exchange(ref t) if t.expose() == "T2"));
    }

    #[test]
    fn second_challenge_is_not_retried() {
        let (state, action) = handle_event(FlowState::ReExchanging, challenge("C2"));
        assert_eq!(state, FlowState::AadError);
        match action {
            FlowAction::HandleAadError(error) => assert_eq!(error.error, "interaction_required"),
            other => panic!("expected HandleAadError, got {other:?}"),
        }
    }

    #[test]
    fn success_from_either_exchange_calls_api() {
        for from in [FlowState::Exchanging, FlowState::ReExchanging] {
            let (state, action) = handle_event(from, success("A2"));
            assert_eq!(state, FlowState::CallingApi);
            assert!(matches!(action, FlowAction::CallApi(ref t) if t.expose() == "A2"));
        }
    }

    #[test]
    fn failed_exchange_routes_to_aad_handler() {
        let error = AadError::new("invalid_grant", "AADSTS65001");
        let (state, action) = handle_event(
            FlowState::Exchanging,
            FlowEvent::ExchangeCompleted(ExchangeResponse::Failed(error.clone())),
        );
        assert_eq!(state, FlowState::AadError);
        assert!(matches!(action, FlowAction::HandleAadError(ref e) if *e == error));
    }

    #[test]
    fn api_result_is_written_then_notified() {
        let data = serde_json::json!({"rows": [1, 2, 3]});
        let (state, action) = handle_event(
            FlowState::CallingApi,
            FlowEvent::ApiResultReceived(data.clone()),
        );
        assert_eq!(state, FlowState::WritingDocument);
        assert!(matches!(action, FlowAction::WriteDocument(ref d) if *d == data));

        let (state, action) = handle_event(state, FlowEvent::DocumentWritten);
        assert_eq!(state, FlowState::Success);
        assert!(matches!(action, FlowAction::Notify(ref m) if m == SUCCESS_MESSAGE));
    }

    #[test]
    fn coded_failure_routes_to_client_handler() {
        let (state, action) = handle_event(
            FlowState::AwaitingBootstrapToken,
            FlowEvent::Failed(HostError::Client(ClientError::new("E1", "denied"))),
        );
        assert_eq!(state, FlowState::ClientError);
        assert!(matches!(action, FlowAction::HandleClientError(ref e) if e.code == "E1"));
    }

    #[test]
    fn uncoded_failure_is_shown_serialized() {
        let (state, action) = handle_event(
            FlowState::CallingApi,
            FlowEvent::Failed(HostError::unclassified("socket closed")),
        );
        assert_eq!(state, FlowState::UnknownError);
        match action {
            FlowAction::Notify(message) => {
                assert_eq!(message, r#"EXCEPTION: {"message":"socket closed"}"#)
            }
            other => panic!("expected Notify, got {other:?}"),
        }
    }

    #[test]
    fn terminal_states_absorb_events() {
        for terminal in [
            FlowState::Success,
            FlowState::AadError,
            FlowState::ClientError,
            FlowState::UnknownError,
        ] {
            let (state, action) = handle_event(terminal.clone(), FlowEvent::Started);
            assert_eq!(state, terminal);
            assert!(matches!(action, FlowAction::None));
        }
    }

    #[test]
    fn out_of_order_event_ends_flow() {
        let (state, action) = handle_event(FlowState::Idle, FlowEvent::DocumentWritten);
        assert_eq!(state, FlowState::UnknownError);
        match action {
            FlowAction::Notify(message) => {
                assert!(message.contains("document_written"), "got: {message}");
                assert!(message.contains("idle"), "got: {message}");
            }
            other => panic!("expected Notify, got {other:?}"),
        }
    }

    #[test]
    fn outcome_only_for_terminal_states() {
        assert_eq!(FlowState::Exchanging.outcome(), None);
        assert_eq!(FlowState::Success.outcome(), Some(Outcome::Success));
        assert_eq!(Outcome::UnknownError.as_str(), "unknown_error");
    }
}
