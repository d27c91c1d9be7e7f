//! Bootstrap-token exchange flow with step-up retry
//!
//! One invocation:
//! 1. Ask the host for a bootstrap token (sign-in prompt allowed)
//! 2. Exchange it for a downstream access token
//! 3. On a claims challenge, ask the host once more with the claims and
//!    exchange the new token (never more than once)
//! 4. Identity-service error → AAD error handler; otherwise call the API,
//!    write the payload into the document, and confirm to the user
//!
//! Coded failures go to the client error handler, anything else is shown
//! to the user as a serialized exception.

pub mod flow;
pub mod handlers;
pub mod metrics;
pub mod state;

pub use flow::{Collaborators, TokenExchangeFlow};
pub use handlers::{NotifyingAadErrorHandler, NotifyingClientErrorHandler};
pub use state::{FlowAction, FlowEvent, FlowState, Outcome, SUCCESS_MESSAGE, handle_event};
