use super::ImageEncoder;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Encoder that never touches the filesystem.
///
/// Each reference becomes `mock://<reference>`, which keeps the reference
/// visible in the outgoing request for assertions.
#[derive(Clone)]
pub struct MockImageEncoder {
    encode_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageEncoder {
    pub fn new() -> Self {
        Self {
            encode_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_encode_count(&self) -> usize {
        *self.encode_count.lock().unwrap()
    }
}

impl Default for MockImageEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageEncoder for MockImageEncoder {
    async fn encode(&self, reference: &str) -> Result<String> {
        *self.encode_count.lock().unwrap() += 1;

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("mock encoder failure for {}", reference),
            )));
        }

        Ok(format!("mock://{}", reference))
    }
}
