//! Microsoft identity platform collaborators
//!
//! Concrete implementations of the `host` traits for a terminal client:
//!
//! - `obo` trades a bootstrap token for a Graph token as a confidential client
//! - `graph` performs the downstream Microsoft Graph call
//! - `device_code` signs the user in with the device authorization grant
//!   and hands back the bootstrap token, including step-up sign-in when the
//!   exchange returns a claims challenge
//! - `service` bundles `obo` and `graph` behind `TokenExchangeService`

pub mod constants;
pub mod device_code;
pub mod error;
pub mod graph;
pub mod obo;
pub mod service;

pub use constants::*;
pub use device_code::{DeviceCodeHostAuth, MAX_SIGN_IN_WAIT};
pub use error::{Error, Result};
pub use graph::GraphEndpoint;
pub use obo::{ConfidentialClient, exchange_on_behalf_of, parse_exchange_body};
pub use service::GraphTokenService;
