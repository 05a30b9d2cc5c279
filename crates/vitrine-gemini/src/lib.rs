//! vitrine-gemini: [`EditGateway`](vitrine_workflow::EditGateway) backed
//! by Google's Generative Language API.
//!
//! Edits and analyses go to `generateContent` with the image inline;
//! generation goes to the Imagen `predict` endpoint. Non-success
//! responses are classified as rate limits (HTTP 429 or a quota marker in
//! the body) or unknown failures. Timeouts are enforced by the HTTP
//! client.

pub mod config;
pub mod error;
pub mod gateway;
pub mod wire;

pub use config::{API_KEY_VARS, GeminiConfig};
pub use error::{GeminiError, classify_status, classify_transport};
pub use gateway::GeminiGateway;
