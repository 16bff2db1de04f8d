//! Structured generation relay for the Gemini API
//!
//! Accepts a caller's conversation payload and generation config, rebuilds it
//! into the exact `generateContent` request shape, calls Gemini with a
//! server-held API key, and hands the generated JSON text back unparsed.

pub mod ai;
pub mod error;
pub mod intake;
pub mod models;
pub mod normalize;
pub mod relay;
pub mod server;

pub use error::{Error, Result};
