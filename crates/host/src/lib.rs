//! Collaborator contracts for the document data flow
//!
//! Defines the traits the token exchange flow drives, plus the values that
//! move between them. Nothing in this crate performs I/O: the Microsoft
//! identity implementations live in `graph-auth`, the console and file
//! implementations in the `graph-data` binary, and tests substitute
//! recording doubles.
//!
//! Async methods return `Pin<Box<dyn Future>>` so every collaborator can be
//! held as `Arc<dyn Trait>`.

pub mod error;
pub mod exchange;
pub mod token;

pub use error::{ClientError, HostError, codes};
pub use exchange::{AadError, ExchangeResponse};
pub use token::{AccessToken, BootstrapToken, TokenOptions};

use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future returned by collaborator methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result alias for collaborator calls.
pub type Result<T> = std::result::Result<T, HostError>;

/// Issues bootstrap identity tokens for the signed-in user.
///
/// The call may suspend for as long as the host needs to run an interactive
/// sign-in or a step-up prompt. Cancellation and denial surface as
/// `HostError::Client` carrying the host's code.
pub trait HostAuthProvider: Send + Sync {
    fn get_access_token<'a>(
        &'a self,
        options: &'a TokenOptions,
    ) -> BoxFuture<'a, Result<BootstrapToken>>;
}

/// Trades bootstrap tokens for downstream access and calls the downstream API.
pub trait TokenExchangeService: Send + Sync {
    /// Exchange a bootstrap token for a downstream-scoped access token.
    ///
    /// Identity-service errors are reported as `ExchangeResponse::Failed`,
    /// not as `Err`. `Err` is reserved for transport and decoding failures.
    fn exchange<'a>(
        &'a self,
        bootstrap: &'a BootstrapToken,
    ) -> BoxFuture<'a, Result<ExchangeResponse>>;

    /// Call the downstream API. The payload is returned untouched.
    fn call_api<'a>(
        &'a self,
        access_token: &'a AccessToken,
    ) -> BoxFuture<'a, Result<serde_json::Value>>;
}

/// Persists an API payload into the user's open document.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, data: &serde_json::Value) -> Result<()>;
}

/// Shows a short status line to the user.
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str);
}

/// Surfaces errors reported by the identity service inside an exchange response.
pub trait AadErrorHandler: Send + Sync {
    fn handle(&self, error: &AadError);
}

/// Surfaces coded errors raised locally, typically by the host's sign-in.
pub trait ClientErrorHandler: Send + Sync {
    fn handle(&self, error: &ClientError);
}
