//! Multi-turn QA dialogue generation
//!
//! [`DialogueGenerator`] renders the instruction prompt, attaches the encoded
//! image, asks the chat engine once, and extracts the dialogue from the reply.
//! The batch methods fan one generation out per image and return results in
//! input order.

pub mod extract;

pub use extract::extract_dialogue;

use crate::ai::{ChatEngine, ChatMessage, ChatMessageContent, MessagePart};
use crate::image::ImageEncoder;
use crate::models::{Dialogue, GenerationOptions};
use crate::{prompts, Error, Result};
use futures_util::future::{join_all, try_join_all};
use std::path::{Path, PathBuf};

/// One or more image references.
///
/// A single path or string converts into a one-element batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatch(Vec<String>);

impl ImageBatch {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for ImageBatch {
    fn from(image: &str) -> Self {
        Self(vec![image.to_string()])
    }
}

impl From<String> for ImageBatch {
    fn from(image: String) -> Self {
        Self(vec![image])
    }
}

impl From<&Path> for ImageBatch {
    fn from(image: &Path) -> Self {
        Self(vec![image.to_string_lossy().into_owned()])
    }
}

impl From<PathBuf> for ImageBatch {
    fn from(image: PathBuf) -> Self {
        Self::from(image.as_path())
    }
}

impl From<Vec<String>> for ImageBatch {
    fn from(images: Vec<String>) -> Self {
        Self(images)
    }
}

impl From<Vec<&str>> for ImageBatch {
    fn from(images: Vec<&str>) -> Self {
        Self(images.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for ImageBatch {
    fn from(images: &[String]) -> Self {
        Self(images.to_vec())
    }
}

pub struct DialogueGenerator {
    engine: Box<dyn ChatEngine>,
    encoder: Box<dyn ImageEncoder>,
}

impl DialogueGenerator {
    pub fn new(engine: Box<dyn ChatEngine>, encoder: Box<dyn ImageEncoder>) -> Self {
        Self { engine, encoder }
    }

    /// The single user message carrying the instructions and the image.
    pub fn build_messages(prompt: String, image_url: String) -> Vec<ChatMessage> {
        vec![ChatMessage::user(ChatMessageContent::Parts(vec![
            MessagePart::text(prompt),
            MessagePart::image_url(image_url),
        ]))]
    }

    /// Generate a dialogue for one image.
    ///
    /// Invalid turn bounds fail before the image is read or the engine is
    /// called. `Ok(None)` means the model replied but no dialogue could be
    /// extracted from its text.
    pub async fn generate(
        &self,
        image: &str,
        options: &GenerationOptions,
    ) -> Result<Option<Dialogue>> {
        options.validate()?;

        let image_url = self.encoder.encode(image).await?;
        let prompt = prompts::render_multiturn_qa(options);
        let messages = Self::build_messages(prompt, image_url);

        tracing::debug!(
            "Generating {}-{} turn dialogue for {}",
            options.min_turns,
            options.max_turns,
            image
        );

        let response = self
            .engine
            .chat_completions(messages.into(), None, None)
            .await?;

        let text = response
            .text()
            .ok_or_else(|| Error::AiProvider("No text in chat completion response".to_string()))?;

        let dialogue = extract_dialogue(text);
        match &dialogue {
            Some(turns) => tracing::info!("Extracted {} messages for {}", turns.len(), image),
            None => tracing::warn!("No dialogue extracted for {}", image),
        }

        Ok(dialogue)
    }

    /// Generate dialogues for every image concurrently.
    ///
    /// Results line up with the input. The first error aborts the batch and
    /// no partial results are returned.
    pub async fn batch_generate(
        &self,
        images: impl Into<ImageBatch>,
        options: &GenerationOptions,
    ) -> Result<Vec<Option<Dialogue>>> {
        let images = images.into();
        options.validate()?;

        tracing::info!("Generating dialogues for {} images", images.len());
        try_join_all(images.iter().map(|image| self.generate(image, options))).await
    }

    /// Same contract as [`batch_generate`](Self::batch_generate), one image at a time.
    pub async fn batch_generate_sequential(
        &self,
        images: impl Into<ImageBatch>,
        options: &GenerationOptions,
    ) -> Result<Vec<Option<Dialogue>>> {
        let images = images.into();
        options.validate()?;

        let mut results = Vec::with_capacity(images.len());
        for image in images.iter() {
            results.push(self.generate(image, options).await?);
        }
        Ok(results)
    }

    /// Concurrent batch that keeps going past failures.
    ///
    /// Each slot holds that image's own outcome. Only invalid options fail
    /// the call as a whole.
    pub async fn batch_generate_settled(
        &self,
        images: impl Into<ImageBatch>,
        options: &GenerationOptions,
    ) -> Result<Vec<Result<Option<Dialogue>>>> {
        let images = images.into();
        options.validate()?;

        let results = join_all(images.iter().map(|image| self.generate(image, options))).await;

        for (image, result) in images.iter().zip(&results) {
            if let Err(e) = result {
                tracing::error!("Generation failed for {}: {}", image, e);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ChatParams, MockChatEngine, OpenAiCompatibleClient};
    use crate::image::MockImageEncoder;
    use crate::models::turn;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn dialogue_reply(question: &str, answer: &str) -> String {
        format!(
            r#"Here you go: {{"messages": [{{"role": "user", "content": "{}"}}, {{"role": "assistant", "content": "{}"}}]}}"#,
            question, answer
        )
    }

    fn make_generator(engine: &MockChatEngine, encoder: &MockImageEncoder) -> DialogueGenerator {
        DialogueGenerator::new(Box::new(engine.clone()), Box::new(encoder.clone()))
    }

    #[tokio::test]
    async fn test_generate_extracts_dialogue() {
        let engine = MockChatEngine::new().with_reply(dialogue_reply("What animal?", "A cat."));
        let encoder = MockImageEncoder::new();
        let generator = make_generator(&engine, &encoder);

        let dialogue = generator
            .generate("cat.png", &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(
            dialogue,
            Some(vec![turn("user", "What animal?"), turn("assistant", "A cat.")])
        );
        assert_eq!(engine.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_image_in_one_message() {
        let engine = MockChatEngine::new();
        let encoder = MockImageEncoder::new();
        let generator = make_generator(&engine, &encoder);

        let options = GenerationOptions::new(2, 4).independent(true);
        generator.generate("dog.jpg", &options).await.unwrap();

        let calls = engine.calls();
        assert_eq!(
            calls[0].messages,
            DialogueGenerator::build_messages(
                prompts::render_multiturn_qa(&options),
                "mock://dog.jpg".to_string()
            )
        );
        assert_eq!(calls[0].model, "mock-model");
        assert_eq!(calls[0].overrides, None);
    }

    #[tokio::test]
    async fn test_invalid_bounds_fail_before_any_io() {
        let engine = MockChatEngine::new();
        let encoder = MockImageEncoder::new();
        let generator = make_generator(&engine, &encoder);

        let err = generator
            .generate("cat.png", &GenerationOptions::new(5, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(engine.get_call_count(), 0);
        assert_eq!(encoder.get_encode_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_bounds_fail_whole_batch_before_any_io() {
        let engine = MockChatEngine::new();
        let encoder = MockImageEncoder::new();
        let generator = make_generator(&engine, &encoder);

        let err = generator
            .batch_generate(vec!["a.png", "b.png"], &GenerationOptions::new(3, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(engine.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_none() {
        let engine = MockChatEngine::new().with_reply("I'd rather not.");
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let dialogue = generator
            .generate("cat.png", &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(dialogue, None);
    }

    #[tokio::test]
    async fn test_engine_errors_propagate() {
        let engine = MockChatEngine::new().with_failure_for("mock://cat.png");
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let err = generator
            .generate("cat.png", &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_encoder_errors_propagate_without_engine_call() {
        let engine = MockChatEngine::new();
        let encoder = MockImageEncoder::new().with_failure(true);
        let generator = make_generator(&engine, &encoder);

        let err = generator
            .generate("cat.png", &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(engine.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_is_deterministic_against_stub() {
        let engine = MockChatEngine::new().with_reply(dialogue_reply("Q", "A"));
        let generator = make_generator(&engine, &MockImageEncoder::new());
        let options = GenerationOptions::default();

        let first = generator.generate("cat.png", &options).await.unwrap();
        let second = generator.generate("cat.png", &options).await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let engine = MockChatEngine::new()
            .with_reply_for("mock://first.png", dialogue_reply("Q1", "A1"))
            .with_reply_for("mock://second.png", dialogue_reply("Q2", "A2"))
            .with_reply_for("mock://third.png", dialogue_reply("Q3", "A3"))
            .with_delay_for("mock://first.png", Duration::from_millis(80))
            .with_delay_for("mock://third.png", Duration::from_millis(80));
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let results = generator
            .batch_generate(
                vec!["first.png", "second.png", "third.png"],
                &GenerationOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(engine.completion_order()[0], 1);
        assert_eq!(
            results,
            vec![
                Some(vec![turn("user", "Q1"), turn("assistant", "A1")]),
                Some(vec![turn("user", "Q2"), turn("assistant", "A2")]),
                Some(vec![turn("user", "Q3"), turn("assistant", "A3")]),
            ]
        );
    }

    #[tokio::test]
    async fn test_batch_single_path_gives_one_result() {
        let engine = MockChatEngine::new();
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let results = generator
            .batch_generate("only.png", &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].is_some());
    }

    #[tokio::test]
    async fn test_batch_fails_fast() {
        let engine = MockChatEngine::new().with_failure_for("mock://bad.png");
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let err = generator
            .batch_generate(vec!["good.png", "bad.png"], &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_sequential_batch_runs_in_order() {
        let engine = MockChatEngine::new()
            .with_delay_for("mock://first.png", Duration::from_millis(30));
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let results = generator
            .batch_generate_sequential(
                vec!["first.png", "second.png", "third.png"],
                &GenerationOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(engine.completion_order(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_settled_batch_keeps_per_item_errors() {
        let engine = MockChatEngine::new()
            .with_failure_for("mock://bad.png")
            .with_reply_for("mock://empty.png", "no json here");
        let generator = make_generator(&engine, &MockImageEncoder::new());

        let results = generator
            .batch_generate_settled(
                vec!["good.png", "bad.png", "empty.png"],
                &GenerationOptions::default(),
            )
            .await
            .unwrap();

        assert!(matches!(results[0], Ok(Some(_))));
        assert!(matches!(results[1], Err(Error::AiProvider(_))));
        assert!(matches!(results[2], Ok(None)));
    }

    #[test]
    fn test_image_batch_conversions() {
        assert_eq!(ImageBatch::from("a.png").len(), 1);
        assert_eq!(ImageBatch::from(PathBuf::from("dir/a.png")).iter().next(), Some("dir/a.png"));
        assert_eq!(ImageBatch::from(vec!["a.png", "b.png"]).len(), 2);
        assert!(ImageBatch::from(Vec::<String>::new()).is_empty());
    }

    #[tokio::test]
    async fn test_generate_against_http_endpoint() {
        use wiremock::matchers::{body_string_contains, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("\"type\":\"image_url\""))
            .and(body_string_contains("mock://street.png"))
            .and(body_string_contains("minimum of 2 turns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": dialogue_reply("How many cars?", "Two.")
                    },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(
            "test-key".to_string(),
            "https://unused.invalid/v1".to_string(),
            "gpt-4o-mini".to_string(),
            ChatParams::defaults(),
        )
        .unwrap()
        .with_base_url(server.uri());
        let generator = DialogueGenerator::new(Box::new(client), Box::new(MockImageEncoder::new()));

        let dialogue = generator
            .generate("street.png", &GenerationOptions::new(2, 3))
            .await
            .unwrap();

        assert_eq!(
            dialogue,
            Some(vec![turn("user", "How many cars?"), turn("assistant", "Two.")])
        );
    }

    #[tokio::test]
    async fn test_missing_reply_text_is_provider_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(
            "test-key".to_string(),
            "https://unused.invalid/v1".to_string(),
            "gpt-4o-mini".to_string(),
            ChatParams::defaults(),
        )
        .unwrap()
        .with_base_url(server.uri());
        let generator = DialogueGenerator::new(Box::new(client), Box::new(MockImageEncoder::new()));

        let err = generator
            .generate("street.png", &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
    }
}
