//! Shared types for the graph-data workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
