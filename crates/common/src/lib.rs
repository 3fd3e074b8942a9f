//! Types shared by the vec2 crates: the redacting `Secret` wrapper for the
//! application secret and the configuration error type.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
