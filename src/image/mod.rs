//! Image encoding for chat requests
//!
//! Turns an image reference into a string that can sit in an `image_url`
//! message part: a base64 data URI for local files, or the reference itself
//! when it already is a URL.

pub mod encoder;
pub mod mock;

pub use encoder::DataUriEncoder;
pub use mock::MockImageEncoder;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(&self, reference: &str) -> Result<String>;
}
