//! Multi-turn image QA dialogue generator
//!
//! Renders an instruction prompt, sends it together with an encoded image to an
//! OpenAI-compatible chat-completion endpoint, and extracts the `"messages"`
//! dialogue the model writes back. Batches of images fan out concurrently and
//! come back in input order.

pub mod ai;
pub mod app;
pub mod error;
pub mod generator;
pub mod image;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
