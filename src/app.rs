//! Application orchestration: generate dialogues for a set of images and save them.

use crate::ai::{ChatEngine, OpenAiCompatibleClient};
use crate::generator::DialogueGenerator;
use crate::image::{DataUriEncoder, ImageEncoder};
use crate::models::{Config, DialogueRecord, GenerationOptions};
use crate::Result;
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// How a run spreads its requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    #[default]
    Concurrent,
    Sequential,
}

/// Summary of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub records: Vec<DialogueRecord>,
}

impl RunReport {
    pub fn generated(&self) -> usize {
        self.records.iter().filter(|r| r.messages.is_some()).count()
    }
}

/// Coordinates dialogue generation and result persistence.
pub struct App {
    generator: DialogueGenerator,
    output_dir: PathBuf,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub engine: Box<dyn ChatEngine>,
    pub encoder: Box<dyn ImageEncoder>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, output_dir: PathBuf) -> Self {
        Self {
            generator: DialogueGenerator::new(services.engine, services.encoder),
            output_dir,
        }
    }

    /// Construct an app from a loaded [`Config`].
    pub fn new(config: &Config) -> Result<Self> {
        let engine = OpenAiCompatibleClient::for_provider(
            config.provider,
            config.api_key.clone(),
            &config.model,
            config.chat_params.clone(),
        )?;

        Ok(Self::with_services(
            AppServices {
                engine: Box::new(engine),
                encoder: Box::new(DataUriEncoder::new()),
            },
            config.output_dir.clone(),
        ))
    }

    /// Generate dialogues for `images` and write them to a fresh results file.
    pub async fn run(
        &self,
        images: Vec<String>,
        options: &GenerationOptions,
        mode: BatchMode,
    ) -> Result<RunReport> {
        info!(
            "Generating {}-{} turn dialogues for {} images ({:?})",
            options.min_turns,
            options.max_turns,
            images.len(),
            mode
        );

        let dialogues = match mode {
            BatchMode::Concurrent => {
                self.generator
                    .batch_generate(images.clone(), options)
                    .await?
            }
            BatchMode::Sequential => {
                self.generator
                    .batch_generate_sequential(images.clone(), options)
                    .await?
            }
        };

        let records: Vec<DialogueRecord> = images
            .into_iter()
            .zip(dialogues)
            .map(|(image, messages)| {
                if messages.is_none() {
                    debug!("No dialogue produced for {}", image);
                }
                DialogueRecord { image, messages }
            })
            .collect();

        fs::create_dir_all(&self.output_dir)?;
        let file_name = format!(
            "{}_{}.json",
            Local::now().format("%Y-%m-%d"),
            Uuid::new_v4()
        );
        let output_path = self.output_dir.join(file_name);
        fs::write(&output_path, serde_json::to_string_pretty(&records)?)?;
        info!("Saved results to {}", output_path.display());

        Ok(RunReport {
            output_path,
            records,
        })
    }
}
